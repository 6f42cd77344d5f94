use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;
use crate::providers::base::{FragmentStream, Provider, ProviderDescriptor};

/// A scripted provider for tests.
///
/// Replies with a fixed list of fragments (joined for one-shot calls), optionally failing
/// after a number of them, and records every conversation it was handed.
pub struct MockProvider {
    descriptor: ProviderDescriptor,
    fragments: Vec<String>,
    fail_after: Option<(usize, String)>,
    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    pub fn new(id: &str, fragments: &[&str]) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(id, format!("Mock {}", id), "mock-model", true),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fail_after: None,
            calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.descriptor.enabled = false;
        self
    }

    /// Fail with `message` once `count` fragments have been produced
    pub fn failing_after(mut self, count: usize, message: &str) -> Self {
        self.fail_after = Some((count, message.to_string()));
        self
    }

    /// Shared handle on the number of backend calls made so far
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared handle on every conversation received
    pub fn received(&self) -> Arc<Mutex<Vec<Vec<Message>>>> {
        Arc::clone(&self.received)
    }

    fn record(&self, messages: &[Message]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(messages.to_vec());
    }

    fn script(&self) -> Vec<ChatResult<String>> {
        match &self.fail_after {
            Some((count, message)) => self
                .fragments
                .iter()
                .take(*count)
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(ChatError::invocation(message.clone()))))
                .collect(),
            None => self.fragments.iter().cloned().map(Ok).collect(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn complete(&self, messages: &[Message]) -> ChatResult<String> {
        self.record(messages);
        self.script().into_iter().collect()
    }

    fn stream(&self, messages: &[Message]) -> ChatResult<FragmentStream> {
        let script = self.script();
        let calls = Arc::clone(&self.calls);
        let received = Arc::clone(&self.received);
        let messages = messages.to_vec();

        // the call is only counted once the stream is first polled
        let started = stream::once(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            received.lock().unwrap().push(messages);
            stream::iter(script)
        });
        Ok(started.flatten().boxed())
    }
}
