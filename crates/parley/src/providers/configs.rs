//! Immutable configuration for every provider and the context augmenter.
//!
//! Built once at process start (see the server's configuration module) and passed by
//! reference into the factory. Nothing here is re-read or mutated afterwards.

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const ANTHROPIC_MAX_TOKENS: i32 = 4096;
pub const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-pro";
pub const LOCAL_MODEL: &str = "offline-echo";

fn has_key(api_key: &Option<String>) -> bool {
    api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
}

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    Anthropic(AnthropicProviderConfig),
    Gemini(GeminiProviderConfig),
    Local(LocalProviderConfig),
}

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl OpenAiProviderConfig {
    pub fn enabled(&self) -> bool {
        has_key(&self.api_key)
    }
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            api_key: None,
            model: OPENAI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: i32,
}

impl AnthropicProviderConfig {
    pub fn enabled(&self) -> bool {
        has_key(&self.api_key)
    }
}

impl Default for AnthropicProviderConfig {
    fn default() -> Self {
        Self {
            host: ANTHROPIC_HOST.to_string(),
            api_key: None,
            model: ANTHROPIC_MODEL.to_string(),
            max_tokens: ANTHROPIC_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl GeminiProviderConfig {
    pub fn enabled(&self) -> bool {
        has_key(&self.api_key)
    }
}

impl Default for GeminiProviderConfig {
    fn default() -> Self {
        Self {
            host: GEMINI_HOST.to_string(),
            api_key: None,
            model: GEMINI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalProviderConfig {
    pub model: String,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            model: LOCAL_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Inputs to the default system directive
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssistantConfig {
    pub name: String,
    pub topics: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "FrogStatus".to_string(),
            topics: vec![
                "Artifact management, security scanning and package curation".to_string(),
                "Build information and deployment status".to_string(),
                "Dependency vulnerabilities and security".to_string(),
                "General development questions".to_string(),
            ],
        }
    }
}

/// Everything the orchestrator needs, resolved once
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub openai: OpenAiProviderConfig,
    pub anthropic: AnthropicProviderConfig,
    pub gemini: GeminiProviderConfig,
    pub local: LocalProviderConfig,
    pub context: ContextConfig,
    pub assistant: AssistantConfig,
}
