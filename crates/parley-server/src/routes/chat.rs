use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::Stream;
use parley::{
    models::request::{ChatBody, ChatReply},
    transport,
};
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio_stream::wrappers::ReceiverStream;

/// Event stream response body, records are written as the transport produces them
pub struct SseResponse {
    rx: ReceiverStream<Bytes>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<Bytes>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx).map(|opt| opt.map(Ok))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            Body::from_stream(self),
        )
            .into_response()
    }
}

// one-shot chat, the whole reply in one body
async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = body?;
    let request = body.into_request(false)?;

    let response = state.orchestrator.dispatch(request).await?.collect().await?;
    Ok(Json(ChatReply { response }))
}

// Rejections before the stream opens keep their status code. After that every failure is
// an error event.
async fn stream_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<SseResponse, ApiError> {
    let Json(body) = body?;
    let request = body.into_request(true)?;

    let completion = state.orchestrator.dispatch(request).await?;
    Ok(SseResponse::new(transport::spawn(completion.into_stream())))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(stream_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use parley::orchestrator::Orchestrator;
    use parley::providers::configs::ChatConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(config: ChatConfig) -> Router {
        routes(AppState::new(Orchestrator::from_config(&config).unwrap()))
    }

    fn openai_config(host: String) -> ChatConfig {
        let mut config = ChatConfig::default();
        config.openai.host = host;
        config.openai.api_key = Some("test_api_key".to_string());
        config
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn error_of(response: Response) -> String {
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_one_shot_local() {
        let response = app(ChatConfig::default())
            .oneshot(post_json(
                "/api/chat",
                json!({"provider": "local", "messages": [{"role": "user", "content": "ping"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({"response": "(offline) You asked: ping"}));
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let response = app(ChatConfig::default())
            .oneshot(post_json("/api/chat", json!({"provider": "local"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_of(response).await,
            "Malformed request: Missing required fields: provider, messages"
        );
    }

    #[tokio::test]
    async fn test_unknown_role_is_bad_request() {
        let response = app(ChatConfig::default())
            .oneshot(post_json(
                "/api/chat",
                json!({"provider": "local", "messages": [{"role": "tool", "content": "x"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_and_unconfigured_providers() {
        let app = app(ChatConfig::default());
        let messages = json!([{"role": "user", "content": "hi"}]);

        let response = app
            .clone()
            .oneshot(post_json("/api/chat", json!({"provider": "ghost", "messages": messages})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "Unknown provider: ghost");

        let response = app
            .oneshot(post_json(
                "/api/chat/stream",
                json!({"provider": "openai", "messages": messages}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error_of(response).await, "Provider openai is not configured");
    }

    #[tokio::test]
    async fn test_streaming_local_is_rejected() {
        let response = app(ChatConfig::default())
            .oneshot(post_json(
                "/api/chat/stream",
                json!({"provider": "local", "messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_of(response).await,
            "Provider local does not support streaming"
        );
    }

    #[tokio::test]
    async fn test_one_shot_backend_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let response = app(openai_config(mock_server.uri()))
            .oneshot(post_json(
                "/api/chat",
                json!({"provider": "openai", "messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_of(response).await, "OpenAI server error: 500");
    }

    #[tokio::test]
    async fn test_stream_records() {
        let mock_server = MockServer::start().await;
        let mut sse = String::new();
        for chunk in ["Hel", "lo"] {
            let event = json!({"choices": [{"index": 0, "delta": {"content": chunk}}]});
            sse.push_str(&format!("data: {}\n\n", event));
        }
        sse.push_str("data: [DONE]\n\n");
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = app(openai_config(mock_server.uri()))
            .oneshot(post_json(
                "/api/chat/stream",
                json!({"provider": "openai", "messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/event-stream");
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["connection"], "keep-alive");

        assert_eq!(
            body_string(response).await,
            "data: {\"content\":\"Hel\",\"done\":false}\n\n\
             data: {\"content\":\"lo\",\"done\":false}\n\n\
             data: {\"content\":\"\",\"done\":true}\n\n"
        );
    }

    #[tokio::test]
    async fn test_stream_backend_failure_becomes_error_event() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached"}
            })))
            .mount(&mock_server)
            .await;

        let response = app(openai_config(mock_server.uri()))
            .oneshot(post_json(
                "/api/chat/stream",
                json!({"provider": "openai", "messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();

        // the backend is only contacted once the stream is open
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            "data: {\"error\":\"OpenAI rate limited the request: Rate limit reached\"}\n\n"
        );
    }
}
