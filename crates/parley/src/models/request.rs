use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::errors::{ChatError, ChatResult};

/// A conversation to dispatch to one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub provider_id: String,
    pub conversation: Vec<Message>,
    pub streaming: bool,
    pub augment: bool,
}

impl ChatRequest {
    pub fn new<S: Into<String>>(provider_id: S, conversation: Vec<Message>) -> Self {
        Self {
            provider_id: provider_id.into(),
            conversation,
            streaming: false,
            augment: false,
        }
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_context(mut self, augment: bool) -> Self {
        self.augment = augment;
        self
    }
}

/// The JSON body accepted by both chat endpoints.
///
/// Every field is optional here so that a missing one becomes a `MalformedRequest`
/// instead of a deserialization failure with a less useful message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(default, alias = "useJFrogContext")]
    pub use_context: bool,
}

impl ChatBody {
    pub fn new<S: Into<String>>(provider: S, messages: Vec<Message>, use_context: bool) -> Self {
        Self {
            provider: Some(provider.into()),
            messages: Some(messages),
            use_context,
        }
    }

    pub fn into_request(self, streaming: bool) -> ChatResult<ChatRequest> {
        match (self.provider, self.messages) {
            (Some(provider), Some(messages)) if !provider.is_empty() => Ok(ChatRequest {
                provider_id: provider,
                conversation: messages,
                streaming,
                augment: self.use_context,
            }),
            _ => Err(ChatError::MalformedRequest(
                "Missing required fields: provider, messages".to_string(),
            )),
        }
    }
}

/// Body of a successful one-shot reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}
