use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider, ProviderDescriptor};
use super::configs::OpenAiProviderConfig;
use super::factory::ProviderType;
use super::utils::{
    check_body_error, handle_response, http_client, messages_to_openai_spec, sse_payloads,
    with_deadline,
};
use crate::errors::ChatResult;
use crate::models::message::Message;

const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
    descriptor: ProviderDescriptor,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> ChatResult<Self> {
        let provider_type = ProviderType::OpenAi;
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

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        )
    }

    fn payload(&self, messages: &[Message], stream: bool) -> Value {
        json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
            "stream": stream,
        })
    }

    async fn post(
        client: &Client,
        url: &str,
        api_key: &str,
        payload: &Value,
        stream: bool,
    ) -> ChatResult<Response> {
        let response = with_deadline(client.post(url), stream)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(payload)
            .send()
            .await?;

        handle_response(PROVIDER, response).await
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn complete(&self, messages: &[Message]) -> ChatResult<String> {
        let payload = self.payload(messages, false);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        tracing::debug!(messages = messages.len(), model = %self.config.model, "openai completion");

        let response = Self::post(&self.client, &self.url(), api_key, &payload, false).await?;
        let body: Value = response.json().await?;
        check_body_error(PROVIDER, &body)?;

        Ok(body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn stream(&self, messages: &[Message]) -> ChatResult<FragmentStream> {
        let payload = self.payload(messages, true);
        let client = self.client.clone();
        let url = self.url();
        let api_key = self.config.api_key.clone().unwrap_or_default();
        tracing::debug!(messages = messages.len(), model = %self.config.model, "openai stream");

        Ok(Box::pin(async_stream::try_stream! {
            let response = Self::post(&client, &url, &api_key, &payload, true).await?;
            let mut payloads = Box::pin(sse_payloads(response));

            while let Some(data) = payloads.next().await {
                let data = data?;
                if data.trim() == "[DONE]" {
                    break;
                }

                let chunk: Value = serde_json::from_str(&data)?;
                check_body_error(PROVIDER, &chunk)?;

                if let Some(text) = chunk["choices"][0]["delta"]["content"].as_str() {
                    if !text.is_empty() {
                        yield text.to_string();
                    }
                }
            }
        }))
    }
}
