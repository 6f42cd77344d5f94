//! Best-effort platform context for a conversation.
//!
//! `fetch` always resolves. Any reason the context could not be retrieved is folded into a
//! labelled placeholder so the turn can go ahead without it.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::{ChatError, ChatResult};
use crate::providers::configs::ContextConfig;
use crate::providers::utils::error_message;

/// Prefix of every placeholder returned instead of real context
pub const UNAVAILABLE_LABEL: &str = "Platform context unavailable";

#[async_trait]
pub trait ContextAugmenter: Send + Sync {
    /// Whether a fetch can return real context, reported in the provider listing
    fn is_enabled(&self) -> bool;

    /// Context for `query`, or a labelled placeholder explaining why there is none
    async fn fetch(&self, query: &str) -> String;
}

pub fn placeholder(reason: &str) -> String {
    format!("{}: {}", UNAVAILABLE_LABEL, reason)
}

/// Queries the platform's context endpoint with `GET {url}?q=<query>`
pub struct PlatformContext {
    client: Client,
    config: ContextConfig,
}

impl PlatformContext {
    pub fn new(config: ContextConfig) -> ChatResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    async fn query(&self, query: &str) -> ChatResult<String> {
        if !self.config.enabled {
            return Err(ChatError::AugmentationUnavailable(
                "context augmentation is disabled".to_string(),
            ));
        }
        let url = self.config.url.as_deref().filter(|url| !url.is_empty()).ok_or_else(|| {
            ChatError::AugmentationUnavailable("no platform url is configured".to_string())
        })?;

        let mut request = self.client.get(url).query(&[("q", query)]);
        if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::AugmentationUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::AugmentationUnavailable(format!("unreadable body: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str(&body)
                .ok()
                .and_then(|value| error_message(&value))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
            return Err(ChatError::AugmentationUnavailable(format!(
                "platform returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl ContextAugmenter for PlatformContext {
    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn fetch(&self, query: &str) -> String {
        match self.query(query).await {
            Ok(text) => text,
            Err(ChatError::AugmentationUnavailable(reason)) => {
                tracing::warn!(%reason, "platform context unavailable");
                placeholder(&reason)
            }
            Err(err) => {
                tracing::warn!(error = %err, "platform context unavailable");
                placeholder(&err.to_string())
            }
        }
    }
}
