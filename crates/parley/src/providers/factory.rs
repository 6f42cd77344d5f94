use std::sync::Arc;

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::{
    anthropic::AnthropicProvider,
    base::Provider,
    configs::{ChatConfig, ProviderConfig},
    gemini::GeminiProvider,
    local::LocalProvider,
    openai::OpenAiProvider,
};
use crate::errors::ChatResult;

/// Registered provider ids, in listing order
#[derive(EnumIter, EnumString, Display, AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    Gemini,
    Local,
}

impl ProviderType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderType::OpenAi => "OpenAI GPT-4",
            ProviderType::Anthropic => "Anthropic Claude",
            ProviderType::Gemini => "Google Gemini",
            ProviderType::Local => "Local Model",
        }
    }

    pub fn config(&self, config: &ChatConfig) -> ProviderConfig {
        match self {
            ProviderType::OpenAi => ProviderConfig::OpenAi(config.openai.clone()),
            ProviderType::Anthropic => ProviderConfig::Anthropic(config.anthropic.clone()),
            ProviderType::Gemini => ProviderConfig::Gemini(config.gemini.clone()),
            ProviderType::Local => ProviderConfig::Local(config.local.clone()),
        }
    }
}

pub fn get_provider(config: ProviderConfig) -> ChatResult<Arc<dyn Provider>> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Arc::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::Anthropic(anthropic_config) => {
            Ok(Arc::new(AnthropicProvider::new(anthropic_config)?))
        }
        ProviderConfig::Gemini(gemini_config) => Ok(Arc::new(GeminiProvider::new(gemini_config)?)),
        ProviderConfig::Local(local_config) => Ok(Arc::new(LocalProvider::new(local_config))),
    }
}

/// Build one adapter per registered provider, enabled or not
pub fn build_providers(config: &ChatConfig) -> ChatResult<Vec<Arc<dyn Provider>>> {
    ProviderType::iter()
        .map(|provider_type| get_provider(provider_type.config(config)))
        .collect()
}
