use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::service::ChatClient;
use super::{ClientError, ClientResult};
use crate::models::message::Message;
use crate::models::request::ChatBody;
use crate::models::role::Role;

/// The provider that has no streaming mode, so the session always asks it one-shot
pub const LOCAL_PROVIDER: &str = "local";

/// One visible line of the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    /// Set when the reply ended in an error. Failed entries are not sent back as history.
    pub failed: bool,
}

impl ChatEntry {
    fn new(role: Role, content: &str, provider: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            provider: provider.to_string(),
            failed: false,
        }
    }

    fn fail(&mut self, err: &ClientError) {
        self.failed = true;
        if self.content.is_empty() {
            self.content = format!("Error: {}", err);
        }
    }
}

/// A conversation with one server, as a user sees it
pub struct ChatSession {
    client: ChatClient,
    entries: Vec<ChatEntry>,
    provider: String,
    use_context: bool,
    streaming: bool,
}

impl ChatSession {
    pub fn new<S: Into<String>>(client: ChatClient, provider: S) -> Self {
        Self {
            client,
            entries: Vec::new(),
            provider: provider.into(),
            use_context: false,
            streaming: true,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn set_provider<S: Into<String>>(&mut self, provider: S) {
        self.provider = provider.into();
    }

    pub fn use_context(&self) -> bool {
        self.use_context
    }

    pub fn set_use_context(&mut self, use_context: bool) {
        self.use_context = use_context;
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// Discard every entry, including a reply still being assembled
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn history(&self) -> Vec<Message> {
        self.entries
            .iter()
            .filter(|entry| !entry.failed)
            .map(|entry| Message::new(entry.role, entry.content.as_str()))
            .collect()
    }

    /// Send one user message and append the reply.
    ///
    /// The assistant entry is appended even when the request fails, holding either the text
    /// received before the failure or `Error: <message>`.
    pub async fn send<F: FnMut(&str)>(
        &mut self,
        content: &str,
        mut on_fragment: F,
    ) -> ClientResult<&ChatEntry> {
        let mut messages = self.history();
        messages.push(Message::user(content));
        let body = ChatBody::new(self.provider.as_str(), messages, self.use_context);

        self.entries
            .push(ChatEntry::new(Role::User, content, &self.provider));
        self.entries
            .push(ChatEntry::new(Role::Assistant, "", &self.provider));
        let index = self.entries.len() - 1;

        let result = if self.provider == LOCAL_PROVIDER || !self.streaming {
            match self.client.send(&body).await {
                Ok(text) => {
                    on_fragment(&text);
                    self.entries[index].content = text;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        } else {
            let Self {
                client, entries, ..
            } = &mut *self;
            client
                .stream(&body, |fragment| {
                    entries[index].content.push_str(fragment);
                    on_fragment(fragment);
                })
                .await
                .map(|message| entries[index].content = message.into_content())
        };

        match result {
            Ok(()) => Ok(&self.entries[index]),
            Err(err) => {
                tracing::warn!(provider = %self.provider, error = %err, "chat request failed");
                self.entries[index].fail(&err);
                Err(err)
            }
        }
    }
}
