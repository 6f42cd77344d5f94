use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::errors::ChatResult;
use crate::models::message::Message;

/// A lazy, single-pass sequence of text fragments.
///
/// Nothing is sent to the backend until the first poll. Dropping the stream abandons the
/// backend request.
pub type FragmentStream = BoxStream<'static, ChatResult<String>>;

/// What an adapter hands back for one invocation
pub enum Completion {
    Text(String),
    Stream(FragmentStream),
}

impl Completion {
    /// Drain the completion into a single string, failing on the first stream error
    pub async fn collect(self) -> ChatResult<String> {
        match self {
            Completion::Text(text) => Ok(text),
            Completion::Stream(mut fragments) => {
                let mut text = String::new();
                while let Some(fragment) = fragments.next().await {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }

    pub fn into_stream(self) -> FragmentStream {
        match self {
            Completion::Stream(fragments) => fragments,
            Completion::Text(text) if text.is_empty() => stream::empty().boxed(),
            Completion::Text(text) => stream::once(async move { Ok(text) }).boxed(),
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Completion::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// How a provider is presented to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    pub model: String,
    pub enabled: bool,
}

impl ProviderDescriptor {
    pub fn new<S: Into<String>, N: Into<String>, M: Into<String>>(
        id: S,
        name: N,
        model: M,
        enabled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            enabled,
        }
    }
}

/// Snapshot of every registered provider, computed once at start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderListing {
    pub providers: Vec<ProviderDescriptor>,
    pub context_enabled: bool,
}

/// Base trait for chat backends (OpenAI, Anthropic, etc)
#[async_trait]
pub trait Provider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Adapters without a streaming mode reject `stream` with `StreamingUnsupported`
    fn supports_streaming(&self) -> bool {
        true
    }

    /// Wait for the full response text
    async fn complete(&self, messages: &[Message]) -> ChatResult<String>;

    /// Start a lazy fragment sequence. Request shaping happens here, all I/O happens on poll.
    fn stream(&self, messages: &[Message]) -> ChatResult<FragmentStream>;

    async fn invoke(&self, messages: &[Message], streaming: bool) -> ChatResult<Completion> {
        if streaming {
            Ok(Completion::Stream(self.stream(messages)?))
        } else {
            Ok(Completion::Text(self.complete(messages).await?))
        }
    }
}
