use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;

/// Upper bound on a whole one-shot request, body included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> ChatResult<Client> {
    let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    Ok(client)
}

/// One-shot requests get `REQUEST_TIMEOUT`. Streaming requests stay open for as long as the
/// backend keeps sending.
pub fn with_deadline(request: RequestBuilder, stream: bool) -> RequestBuilder {
    if stream {
        request
    } else {
        request.timeout(REQUEST_TIMEOUT)
    }
}

/// Convert internal messages to OpenAI's chat message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_str(),
                "content": message.content,
            })
        })
        .collect()
}

/// Pull a human readable message out of a backend error body.
///
/// Handles `{"error": {"message": ..}}` (OpenAI, Anthropic, Gemini) and `{"error": ".."}`.
pub fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(String::from)
}

/// Pass successful responses through, turn anything else into a `ProviderInvocation` error
pub async fn handle_response(provider: &str, response: Response) -> ChatResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| error_message(&body))
        .unwrap_or(text);

    let message = match status {
        StatusCode::TOO_MANY_REQUESTS => format!("{} rate limited the request: {}", provider, detail),
        status if status.is_server_error() => {
            format!("{} server error: {}: {}", provider, status.as_u16(), detail)
        }
        status => format!("{} request failed: {}: {}", provider, status.as_u16(), detail),
    };
    Err(ChatError::invocation(message.trim_end_matches([' ', ':']).to_string()))
}

/// Fail on an `error` member inside an otherwise successful body
pub fn check_body_error(provider: &str, body: &Value) -> ChatResult<()> {
    match error_message(body) {
        Some(message) => Err(ChatError::invocation(format!("{} error: {}", provider, message))),
        None => Ok(()),
    }
}

/// Split a server-sent-event body into `data:` payloads, in arrival order.
///
/// Lines may span network reads, so bytes are buffered until a newline arrives. Comment,
/// `event:` and blank lines are skipped.
pub fn sse_payloads(response: Response) -> impl Stream<Item = ChatResult<String>> + Send + 'static {
    async_stream::try_stream! {
        let mut body = Box::pin(response.bytes_stream());
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(payload) = data_payload(&line) {
                    yield payload;
                }
            }
        }

        if let Some(payload) = data_payload(&buffer) {
            yield payload;
        }
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}
