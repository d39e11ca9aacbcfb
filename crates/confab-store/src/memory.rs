//! In-memory [`ConversationStore`] backend for tests and offline demos.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use confab_shared::types::{ContactId, MessageId};

use crate::error::Result;
use crate::models::{Message, MessageDraft, UserProfile};
use crate::store::{self, ConversationStore};

/// HashMap-backed store with the same simulated-latency behaviour as the
/// file-backed one. Latency defaults to zero so tests stay fast.
pub struct MemoryStore {
    latency: Duration,
    conversations: Mutex<HashMap<ContactId, Vec<Message>>>,
    profile: Mutex<UserProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            conversations: Mutex::new(HashMap::new()),
            profile: Mutex::new(UserProfile::default()),
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list_messages(&self, contact: &ContactId) -> Result<Vec<Message>> {
        self.simulate_latency().await;
        let conversations = self.conversations.lock().await;
        Ok(conversations.get(contact).cloned().unwrap_or_default())
    }

    async fn append_message(&self, contact: &ContactId, draft: MessageDraft) -> Result<Message> {
        self.simulate_latency().await;
        let message = store::materialize(draft);
        let mut conversations = self.conversations.lock().await;
        conversations
            .entry(contact.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn mark_read(&self, contact: &ContactId, message: &MessageId) -> Result<()> {
        self.simulate_latency().await;
        let mut conversations = self.conversations.lock().await;
        if let Some(messages) = conversations.get_mut(contact) {
            if let Some(msg) = messages.iter_mut().find(|m| &m.id == message) {
                msg.read = true;
            }
        }
        Ok(())
    }

    async fn edit_message(
        &self,
        contact: &ContactId,
        message: &MessageId,
        new_text: &str,
    ) -> Result<Option<Message>> {
        self.simulate_latency().await;
        let mut conversations = self.conversations.lock().await;
        let Some(messages) = conversations.get_mut(contact) else {
            return Ok(None);
        };
        let Some(msg) = messages.iter_mut().find(|m| &m.id == message) else {
            return Ok(None);
        };
        store::apply_edit(msg, new_text);
        Ok(Some(msg.clone()))
    }

    async fn delete_message(&self, contact: &ContactId, message: &MessageId) -> Result<()> {
        self.simulate_latency().await;
        let mut conversations = self.conversations.lock().await;
        if let Some(messages) = conversations.get_mut(contact) {
            if let Some(msg) = messages.iter_mut().find(|m| &m.id == message) {
                store::apply_delete(msg);
            }
        }
        Ok(())
    }

    async fn profile(&self) -> Result<UserProfile> {
        self.simulate_latency().await;
        Ok(self.profile.lock().await.clone())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.simulate_latency().await;
        *self.profile.lock().await = profile.clone();
        Ok(())
    }
}
