use thiserror::Error;

/// Every failure the chat core can report to a caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {0} is not configured")]
    ProviderNotConfigured(String),

    #[error("Provider {0} does not support streaming")]
    StreamingUnsupported(String),

    #[error("{0}")]
    ProviderInvocation(String),

    /// Only ever produced inside the context augmenter, which downgrades it to placeholder text.
    #[error("Context unavailable: {0}")]
    AugmentationUnavailable(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl ChatError {
    pub fn invocation<S: Into<String>>(message: S) -> Self {
        ChatError::ProviderInvocation(message.into())
    }

    /// True for errors detected before any backend was contacted
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ChatError::UnknownProvider(_)
                | ChatError::ProviderNotConfigured(_)
                | ChatError::StreamingUnsupported(_)
                | ChatError::MalformedRequest(_)
        )
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::ProviderInvocation(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::ProviderInvocation(format!("Invalid response from provider: {}", err))
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
