use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use parley::providers::configs::{
    AnthropicProviderConfig, AssistantConfig, ChatConfig, ContextConfig, GeminiProviderConfig,
    LocalProviderConfig, OpenAiProviderConfig, ANTHROPIC_HOST, ANTHROPIC_MAX_TOKENS,
    ANTHROPIC_MODEL, GEMINI_HOST, GEMINI_MODEL, LOCAL_MODEL, OPENAI_HOST, OPENAI_MODEL,
};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address))
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoteProviderSettings {
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicSettings {
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: i32,
}

#[derive(Debug, Deserialize)]
pub struct LocalSettings {
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct ContextSettings {
    pub enabled: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantSettings {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub openai: RemoteProviderSettings,
    pub anthropic: AnthropicSettings,
    pub gemini: RemoteProviderSettings,
    pub local: LocalSettings,
    pub context: ContextSettings,
    pub assistant: AssistantSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Provider defaults
            .set_default("openai.host", OPENAI_HOST)?
            .set_default("openai.model", OPENAI_MODEL)?
            .set_default("anthropic.host", ANTHROPIC_HOST)?
            .set_default("anthropic.model", ANTHROPIC_MODEL)?
            .set_default("anthropic.max_tokens", ANTHROPIC_MAX_TOKENS)?
            .set_default("gemini.host", GEMINI_HOST)?
            .set_default("gemini.model", GEMINI_MODEL)?
            .set_default("local.model", LOCAL_MODEL)?
            // Context and directive defaults
            .set_default("context.enabled", false)?
            .set_default("assistant.name", AssistantConfig::default().name)?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    // Everything has a default except what only the user can supply
    fn validate(&self) -> Result<(), ConfigError> {
        let has_url = self
            .context
            .url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if self.context.enabled && !has_url {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var("context.url"),
            });
        }
        Ok(())
    }

    /// Convert into the immutable library configuration
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            openai: OpenAiProviderConfig {
                host: self.openai.host.clone(),
                api_key: self.openai.api_key.clone(),
                model: self.openai.model.clone(),
            },
            anthropic: AnthropicProviderConfig {
                host: self.anthropic.host.clone(),
                api_key: self.anthropic.api_key.clone(),
                model: self.anthropic.model.clone(),
                max_tokens: self.anthropic.max_tokens,
            },
            gemini: GeminiProviderConfig {
                host: self.gemini.host.clone(),
                api_key: self.gemini.api_key.clone(),
                model: self.gemini.model.clone(),
            },
            local: LocalProviderConfig {
                model: self.local.model.clone(),
            },
            context: ContextConfig {
                enabled: self.context.enabled,
                url: self.context.url.clone(),
                token: self.context.token.clone(),
            },
            assistant: AssistantConfig {
                name: self.assistant.name.clone(),
                ..Default::default()
            },
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}
