use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider, ProviderDescriptor};
use super::configs::GeminiProviderConfig;
use super::factory::ProviderType;
use super::utils::{check_body_error, handle_response, http_client, sse_payloads, with_deadline};
use crate::errors::ChatResult;
use crate::models::message::{joined_system_content, Message};
use crate::models::role::Role;

const PROVIDER: &str = "Gemini";

pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
    descriptor: ProviderDescriptor,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> ChatResult<Self> {
        let provider_type = ProviderType::Gemini;
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

    fn url(&self, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent?alt=sse"
        } else {
            "generateContent"
        };
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.host.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    /// Gemini calls the assistant `model` and takes system content as `systemInstruction`
    fn payload(messages: &[Message]) -> Value {
        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| !m.is_system())
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        let mut payload = json!({ "contents": contents });
        if let (Some(system), Some(object)) =
            (joined_system_content(messages), payload.as_object_mut())
        {
            object.insert(
                "systemInstruction".to_string(),
                json!({"parts": [{"text": system}]}),
            );
        }
        payload
    }

    /// Concatenated text of every part of the first candidate
    fn candidate_text(body: &Value) -> String {
        body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    async fn post(
        client: &Client,
        url: &str,
        api_key: &str,
        payload: &Value,
        stream: bool,
    ) -> ChatResult<Response> {
        let response = with_deadline(client.post(url), stream)
            .header("x-goog-api-key", api_key)
            .json(payload)
            .send()
            .await?;

        handle_response(PROVIDER, response).await
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn complete(&self, messages: &[Message]) -> ChatResult<String> {
        let payload = Self::payload(messages);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        tracing::debug!(messages = messages.len(), model = %self.config.model, "gemini completion");

        let response = Self::post(&self.client, &self.url(false), api_key, &payload, false).await?;
        let body: Value = response.json().await?;
        check_body_error(PROVIDER, &body)?;

        Ok(Self::candidate_text(&body))
    }

    fn stream(&self, messages: &[Message]) -> ChatResult<FragmentStream> {
        let payload = Self::payload(messages);
        let client = self.client.clone();
        let url = self.url(true);
        let api_key = self.config.api_key.clone().unwrap_or_default();
        tracing::debug!(messages = messages.len(), model = %self.config.model, "gemini stream");

        Ok(Box::pin(async_stream::try_stream! {
            let response = Self::post(&client, &url, &api_key, &payload, true).await?;
            let mut payloads = Box::pin(sse_payloads(response));

            while let Some(data) = payloads.next().await {
                let chunk: Value = serde_json::from_str(&data?)?;
                check_body_error(PROVIDER, &chunk)?;

                let text = Self::candidate_text(&chunk);
                if !text.is_empty() {
                    yield text;
                }
            }
        }))
    }
}
