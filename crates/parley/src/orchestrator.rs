use std::sync::Arc;

use anyhow::Result;

use crate::context::{ContextAugmenter, PlatformContext};
use crate::errors::{ChatError, ChatResult};
use crate::models::message::{last_user_content, Message};
use crate::models::request::ChatRequest;
use crate::prompt_template::system_prompt;
use crate::providers::base::{Completion, Provider, ProviderListing};
use crate::providers::configs::ChatConfig;
use crate::providers::factory::build_providers;

/// Single entry point for one-shot and streaming chat.
///
/// Holds only read-only state built at start, so one instance is shared by every request.
pub struct Orchestrator {
    providers: Vec<Arc<dyn Provider>>,
    augmenter: Arc<dyn ContextAugmenter>,
    system_prompt: String,
    listing: ProviderListing,
}

impl Orchestrator {
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        augmenter: Arc<dyn ContextAugmenter>,
        system_prompt: String,
    ) -> Self {
        let listing = ProviderListing {
            providers: providers.iter().map(|p| p.descriptor().clone()).collect(),
            context_enabled: augmenter.is_enabled(),
        };
        Self {
            providers,
            augmenter,
            system_prompt,
            listing,
        }
    }

    /// Build the registry, the augmenter and the default directive from configuration
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let providers = build_providers(config)?;
        let augmenter = Arc::new(PlatformContext::new(config.context.clone())?);
        let system_prompt = system_prompt(&config.assistant)?;
        Ok(Self::new(providers, augmenter, system_prompt))
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn listing(&self) -> &ProviderListing {
        &self.listing
    }

    /// Look up an enabled adapter by its exact id
    pub fn resolve(&self, provider_id: &str) -> ChatResult<&Arc<dyn Provider>> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.descriptor().id == provider_id)
            .ok_or_else(|| ChatError::UnknownProvider(provider_id.to_string()))?;

        if !provider.descriptor().enabled {
            return Err(ChatError::ProviderNotConfigured(provider_id.to_string()));
        }
        Ok(provider)
    }

    /// Prepend the default directive unless the conversation already opens with a system message
    pub fn normalize(&self, conversation: Vec<Message>) -> Vec<Message> {
        match conversation.first() {
            Some(first) if first.is_system() => conversation,
            _ => {
                let mut messages = Vec::with_capacity(conversation.len() + 1);
                messages.push(Message::system(self.system_prompt.as_str()));
                messages.extend(conversation);
                messages
            }
        }
    }

    /// Run one request. A streaming completion is cold: the backend is not contacted until
    /// the returned stream is first polled.
    pub async fn dispatch(&self, request: ChatRequest) -> ChatResult<Completion> {
        let provider = self.resolve(&request.provider_id)?;
        if request.streaming && !provider.supports_streaming() {
            return Err(ChatError::StreamingUnsupported(request.provider_id));
        }

        let mut messages = self.normalize(request.conversation);
        if request.augment {
            let query = last_user_content(&messages).to_string();
            let context = self.augmenter.fetch(&query).await;
            messages.push(Message::system(format!("Platform context: {}", context)));
        }

        tracing::info!(
            provider = %request.provider_id,
            streaming = request.streaming,
            augment = request.augment,
            messages = messages.len(),
            "dispatching chat"
        );
        provider.invoke(&messages, request.streaming).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::placeholder;
    use crate::models::role::Role;
    use crate::providers::configs::LocalProviderConfig;
    use crate::providers::local::LocalProvider;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIRECTIVE: &str = "You are a test directive.";

    struct FakeContext {
        reply: Option<String>,
        fetches: Arc<AtomicUsize>,
    }

    impl FakeContext {
        fn answering(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn unavailable() -> Self {
            Self {
                reply: None,
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ContextAugmenter for FakeContext {
        fn is_enabled(&self) -> bool {
            self.reply.is_some()
        }

        async fn fetch(&self, query: &str) -> String {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => format!("{} for '{}'", reply, query),
                None => placeholder("platform returned 503: down"),
            }
        }
    }

    fn orchestrator(providers: Vec<Arc<dyn Provider>>, context: FakeContext) -> Orchestrator {
        Orchestrator::new(providers, Arc::new(context), DIRECTIVE.to_string())
    }

    fn single(provider: MockProvider) -> Orchestrator {
        orchestrator(vec![Arc::new(provider)], FakeContext::unavailable())
    }

    #[test]
    fn test_caller_system_message_is_kept() {
        let orchestrator = single(MockProvider::new("mock", &[]));
        let conversation = vec![Message::system("custom"), Message::user("hi")];

        let normalized = orchestrator.normalize(conversation.clone());
        assert_eq!(normalized, conversation);
    }

    #[test]
    fn test_directive_is_prepended_once() {
        let orchestrator = single(MockProvider::new("mock", &[]));
        let normalized = orchestrator.normalize(vec![Message::user("hi"), Message::assistant("yo")]);

        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0], Message::system(DIRECTIVE));
        assert_eq!(normalized.iter().filter(|m| m.is_system()).count(), 1);
    }

    #[test]
    fn test_later_system_message_still_gets_directive() {
        let orchestrator = single(MockProvider::new("mock", &[]));
        let normalized = orchestrator.normalize(vec![Message::user("hi"), Message::system("late")]);

        assert_eq!(normalized[0], Message::system(DIRECTIVE));
        assert_eq!(normalized[2], Message::system("late"));
    }

    #[test]
    fn test_empty_conversation_gets_directive() {
        let orchestrator = single(MockProvider::new("mock", &[]));
        assert_eq!(orchestrator.normalize(vec![]), vec![Message::system(DIRECTIVE)]);
    }

    #[tokio::test]
    async fn test_unknown_provider_makes_no_calls() {
        let mock = MockProvider::new("openai", &["hi"]);
        let calls = mock.calls();
        let context = FakeContext::answering("ctx");
        let fetches = Arc::clone(&context.fetches);
        let orchestrator = orchestrator(vec![Arc::new(mock)], context);

        let request = ChatRequest::new("ghost", vec![Message::user("hi")]).with_context(true);
        let result = orchestrator.dispatch(request).await;

        assert!(matches!(result, Err(ChatError::UnknownProvider(id)) if id == "ghost"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_ids_are_case_sensitive() {
        let orchestrator = single(MockProvider::new("openai", &["hi"]));
        let result = orchestrator.dispatch(ChatRequest::new("OpenAI", vec![])).await;
        assert!(matches!(result, Err(ChatError::UnknownProvider(_))));
    }

    #[tokio::test]
    async fn test_disabled_provider_makes_no_calls() {
        let mock = MockProvider::new("openai", &["hi"]).disabled();
        let calls = mock.calls();
        let orchestrator = single(mock);

        let request = ChatRequest::new("openai", vec![Message::user("hi")]);
        let result = orchestrator.dispatch(request).await;

        assert!(matches!(result, Err(ChatError::ProviderNotConfigured(id)) if id == "openai"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_shot_dispatch() {
        let mock = MockProvider::new("mock", &["Hel", "lo"]);
        let received = mock.received();
        let orchestrator = single(mock);

        let completion = orchestrator
            .dispatch(ChatRequest::new("mock", vec![Message::user("hi")]))
            .await
            .unwrap();

        assert!(matches!(&completion, Completion::Text(text) if text == "Hello"));
        let received = received.lock().unwrap();
        assert_eq!(received[0], vec![Message::system(DIRECTIVE), Message::user("hi")]);
    }

    #[tokio::test]
    async fn test_streaming_dispatch_is_cold() {
        let mock = MockProvider::new("mock", &["Hel", "lo"]);
        let calls = mock.calls();
        let orchestrator = single(mock);

        let completion = orchestrator
            .dispatch(ChatRequest::new("mock", vec![Message::user("hi")]).streaming(true))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let fragments: Vec<String> = completion
            .into_stream()
            .map(|fragment| fragment.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["Hel", "lo"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_streaming_matches_one_shot() {
        let orchestrator = single(MockProvider::new("mock", &["The ", "quick ", "fox"]));
        let conversation = vec![Message::user("tell me")];

        let one_shot = orchestrator
            .dispatch(ChatRequest::new("mock", conversation.clone()))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        let streamed = orchestrator
            .dispatch(ChatRequest::new("mock", conversation).streaming(true))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        assert_eq!(one_shot, streamed);
    }

    #[tokio::test]
    async fn test_augmentation_appends_context_after_conversation() {
        let mock = MockProvider::new("mock", &["ok"]);
        let received = mock.received();
        let orchestrator = orchestrator(vec![Arc::new(mock)], FakeContext::answering("build 42"));

        let conversation = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("status?"),
        ];
        orchestrator
            .dispatch(ChatRequest::new("mock", conversation).with_context(true))
            .await
            .unwrap();

        let received = received.lock().unwrap();
        let sent = &received[0];
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0], Message::system(DIRECTIVE));
        assert_eq!(sent[4].role, Role::System);
        assert_eq!(sent[4].content, "Platform context: build 42 for 'status?'");
    }

    #[tokio::test]
    async fn test_failed_augmentation_still_dispatches() {
        let mock = MockProvider::new("mock", &["fine"]);
        let received = mock.received();
        let orchestrator = single(mock);

        let completion = orchestrator
            .dispatch(ChatRequest::new("mock", vec![Message::user("hi")]).with_context(true))
            .await
            .unwrap();

        assert_eq!(completion.collect().await.unwrap(), "fine");
        let received = received.lock().unwrap();
        assert_eq!(
            received[0].last().unwrap().content,
            "Platform context: Platform context unavailable: platform returned 503: down"
        );
    }

    #[tokio::test]
    async fn test_augmentation_without_user_message_uses_empty_query() {
        let mock = MockProvider::new("mock", &["ok"]);
        let received = mock.received();
        let orchestrator = orchestrator(vec![Arc::new(mock)], FakeContext::answering("ctx"));

        orchestrator
            .dispatch(ChatRequest::new("mock", vec![Message::system("only")]).with_context(true))
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received[0][1].content, "Platform context: ctx for ''");
    }

    #[tokio::test]
    async fn test_streaming_to_local_is_rejected_before_augmentation() {
        let context = FakeContext::answering("ctx");
        let fetches = Arc::clone(&context.fetches);
        let local: Arc<dyn Provider> = Arc::new(LocalProvider::new(LocalProviderConfig::default()));
        let orchestrator = orchestrator(vec![local], context);

        let request = ChatRequest::new("local", vec![Message::user("hi")])
            .streaming(true)
            .with_context(true);
        let result = orchestrator.dispatch(request).await;

        assert!(matches!(result, Err(ChatError::StreamingUnsupported(id)) if id == "local"));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_prior_fragments() {
        let orchestrator = single(MockProvider::new("mock", &["Hel", "lo"]).failing_after(1, "boom"));

        let fragments: Vec<ChatResult<String>> = orchestrator
            .dispatch(ChatRequest::new("mock", vec![Message::user("hi")]).streaming(true))
            .await
            .unwrap()
            .into_stream()
            .collect()
            .await;

        assert_eq!(
            fragments,
            vec![Ok("Hel".to_string()), Err(ChatError::invocation("boom"))]
        );
    }

    #[test]
    fn test_from_config_listing() {
        let orchestrator = Orchestrator::from_config(&ChatConfig::default()).unwrap();
        let listing = orchestrator.listing();

        let ids: Vec<&str> = listing.providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["openai", "anthropic", "gemini", "local"]);
        assert!(!listing.context_enabled);
        assert!(orchestrator.system_prompt().contains("FrogStatus"));
    }
}
