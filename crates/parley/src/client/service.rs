use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::Value;

use super::assembler::AssembledMessage;
use super::consumer::consume;
use super::{ClientError, ClientResult};
use crate::models::request::{ChatBody, ChatReply};
use crate::providers::base::ProviderListing;
use crate::providers::utils::error_message;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:4000";

/// HTTP client for the chat endpoints
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new<S: Into<String>>(base_url: S) -> ClientResult<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/chat{}", self.base_url, path)
    }

    pub async fn providers(&self) -> ClientResult<ProviderListing> {
        let response = self.http.get(self.url("/providers")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// One-shot request, returns the whole reply
    pub async fn send(&self, body: &ChatBody) -> ClientResult<String> {
        let response = self.http.post(self.url("")).json(body).send().await?;
        let reply: ChatReply = check(response).await?.json().await?;
        Ok(reply.response)
    }

    /// Streaming request, `on_fragment` sees every piece of content as it arrives
    pub async fn stream<F: FnMut(&str)>(
        &self,
        body: &ChatBody,
        on_fragment: F,
    ) -> ClientResult<AssembledMessage> {
        let response = self.http.post(self.url("/stream")).json(body).send().await?;
        let records = check(response)
            .await?
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from));

        consume(records, on_fragment).await
    }
}

/// Turn a refused request into `ClientError::Status` with the server's `error` text
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| error_message(&body))
        .unwrap_or_else(|| format!("Stream failed: {}", status));
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
