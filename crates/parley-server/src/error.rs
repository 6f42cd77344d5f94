use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley::errors::ChatError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

// Helper function to format environment variable names
pub fn to_env_var(field_path: &str) -> String {
    // nested fields use double underscores, e.g. openai.api_key -> PARLEY_OPENAI__API_KEY
    let normalized_path = field_path.replace('.', "__");
    format!("PARLEY_{}", normalized_path.to_uppercase())
}

/// A chat failure on its way out as an HTTP response with an `{"error": ..}` body
#[derive(Debug)]
pub struct ApiError(pub ChatError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChatError::MalformedRequest(_)
            | ChatError::UnknownProvider(_)
            | ChatError::StreamingUnsupported(_) => StatusCode::BAD_REQUEST,
            ChatError::ProviderNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::ProviderInvocation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ChatError::MalformedRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_rejection() {
            tracing::warn!(%status, error = %self.0, "chat request rejected");
        } else {
            tracing::error!(%status, error = %self.0, "chat request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
