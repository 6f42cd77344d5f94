//! An in-process model that needs no network and no credentials.
//!
//! The provider is always enabled and only answers one-shot requests. Generation runs on a
//! blocking worker thread so a heavy model never stalls the async runtime.
use std::sync::Arc;

use async_trait::async_trait;

use super::base::{FragmentStream, Provider, ProviderDescriptor};
use super::configs::LocalProviderConfig;
use super::factory::ProviderType;
use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;
use crate::models::role::Role;

/// Minimal interface for an on-device text generator
pub trait LocalModel: Send + Sync {
    /// A static identifier for the model implementation
    fn name(&self) -> &'static str;

    /// Produce the full continuation of `prompt`. May block.
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Deterministic offline responder used when no real local model is installed.
///
/// Answers with the last `User:` line of the prompt, so identical conversations always
/// produce identical output.
#[derive(Debug, Default, Clone)]
pub struct OfflineEcho;

impl LocalModel for OfflineEcho {
    fn name(&self) -> &'static str {
        "offline-echo"
    }

    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let question = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix("User: "))
            .map(str::trim)
            .unwrap_or_default();

        if question.is_empty() {
            Ok("I'm running offline. Ask me something and I'll repeat it back.".to_string())
        } else {
            Ok(format!("(offline) You asked: {}", question))
        }
    }
}

pub struct LocalProvider {
    model: Arc<dyn LocalModel>,
    descriptor: ProviderDescriptor,
}

impl LocalProvider {
    pub fn new(config: LocalProviderConfig) -> Self {
        Self::with_model(config, Arc::new(OfflineEcho))
    }

    pub fn with_model(config: LocalProviderConfig, model: Arc<dyn LocalModel>) -> Self {
        let provider_type = ProviderType::Local;
        let descriptor = ProviderDescriptor::new(
            provider_type.to_string(),
            provider_type.display_name(),
            config.model,
            true,
        );
        Self { model, descriptor }
    }

    /// Flatten the conversation into a plain text prompt ending with an open assistant turn
    pub fn format_prompt(messages: &[Message]) -> String {
        let mut prompt = String::new();
        for message in messages {
            let speaker = match message.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(speaker);
            prompt.push_str(": ");
            prompt.push_str(&message.content);
            prompt.push('\n');
        }
        prompt.push_str("Assistant:");
        prompt
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn complete(&self, messages: &[Message]) -> ChatResult<String> {
        let prompt = Self::format_prompt(messages);
        let model = Arc::clone(&self.model);
        tracing::debug!(model = model.name(), prompt_len = prompt.len(), "local completion");

        tokio::task::spawn_blocking(move || model.generate(&prompt))
            .await
            .map_err(|e| ChatError::invocation(format!("Local model task failed: {}", e)))?
            .map_err(|e| ChatError::invocation(format!("Local model error: {}", e)))
    }

    fn stream(&self, _messages: &[Message]) -> ChatResult<FragmentStream> {
        Err(ChatError::StreamingUnsupported(self.descriptor.id.clone()))
    }
}
