use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider, ProviderDescriptor};
use super::configs::AnthropicProviderConfig;
use super::factory::ProviderType;
use super::utils::{check_body_error, handle_response, http_client, sse_payloads, with_deadline};
use crate::errors::{ChatError, ChatResult};
use crate::models::message::{joined_system_content, Message};

const PROVIDER: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
    descriptor: ProviderDescriptor,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> ChatResult<Self> {
        let provider_type = ProviderType::Anthropic;
        let descriptor = ProviderDescriptor::new(
            provider_type.to_string(),
            provider_type.display_name(),
            &config.model,
            config.enabled(),
        );

        Ok(Self {
            client: http_client()?,
            config,
            descriptor,
        })
    }

    /// System content travels in the top level `system` field, never as a turn
    fn messages_to_anthropic_spec(messages: &[Message]) -> (Option<String>, Vec<Value>) {
        let turns = messages
            .iter()
            .filter(|m| !m.is_system())
            .map(|m| {
                json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        (joined_system_content(messages), turns)
    }

    fn payload(&self, messages: &[Message], stream: bool) -> Value {
        let (system, turns) = Self::messages_to_anthropic_spec(messages);

        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": turns,
            "stream": stream,
        });
        if let (Some(system), Some(object)) = (system, payload.as_object_mut()) {
            object.insert("system".to_string(), json!(system));
        }
        payload
    }

    fn url(&self) -> String {
        format!("{}/v1/messages", self.config.host.trim_end_matches('/'))
    }

    async fn post(
        client: &Client,
        url: &str,
        api_key: &str,
        payload: &Value,
        stream: bool,
    ) -> ChatResult<Response> {
        let response = with_deadline(client.post(url), stream)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(payload)
            .send()
            .await?;

        handle_response(PROVIDER, response).await
    }

    /// Text carried by one streaming event, if any
    fn event_text(event: &Value) -> ChatResult<Option<&str>> {
        match event["type"].as_str() {
            Some("content_block_delta") if event["delta"]["type"] == "text_delta" => {
                Ok(event["delta"]["text"].as_str())
            }
            Some("error") => Err(ChatError::invocation(format!(
                "{} error: {}",
                PROVIDER,
                event["error"]["message"].as_str().unwrap_or("stream failed")
            ))),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn complete(&self, messages: &[Message]) -> ChatResult<String> {
        let payload = self.payload(messages, false);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        tracing::debug!(messages = messages.len(), model = %self.config.model, "anthropic completion");

        let response = Self::post(&self.client, &self.url(), api_key, &payload, false).await?;
        let body: Value = response.json().await?;
        check_body_error(PROVIDER, &body)?;

        let text = body["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find(|block| block["type"] == "text"))
            .and_then(|block| block["text"].as_str())
            .unwrap_or_default();
        Ok(text.to_string())
    }

    fn stream(&self, messages: &[Message]) -> ChatResult<FragmentStream> {
        let payload = self.payload(messages, true);
        let client = self.client.clone();
        let url = self.url();
        let api_key = self.config.api_key.clone().unwrap_or_default();
        tracing::debug!(messages = messages.len(), model = %self.config.model, "anthropic stream");

        Ok(Box::pin(async_stream::try_stream! {
            let response = Self::post(&client, &url, &api_key, &payload, true).await?;
            let mut payloads = Box::pin(sse_payloads(response));

            while let Some(data) = payloads.next().await {
                let event: Value = serde_json::from_str(&data?)?;
                if event["type"] == "message_stop" {
                    break;
                }
                if let Some(text) = Self::event_text(&event)? {
                    if !text.is_empty() {
                        yield text.to_string();
                    }
                }
            }
        }))
    }
}
