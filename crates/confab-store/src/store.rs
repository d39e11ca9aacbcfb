//! The [`ConversationStore`] trait and helpers shared by its backends.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use confab_shared::types::{ContactId, MessageId, MessageKind, Sender};

use crate::error::Result;
use crate::models::{Contact, Message, MessageDraft, UserProfile};

/// Persistence seam for conversations and the user profile.
///
/// All methods carry the backend's simulated latency. Mutations are
/// conversation-local; there is a single writer, so no operation needs
/// cross-conversation coordination.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Ordered message list for a contact; empty if none exist yet.
    async fn list_messages(&self, contact: &ContactId) -> Result<Vec<Message>>;

    /// Assign an id and timestamp, append, persist, and return the stored
    /// record. Counterparty messages start read; local ones start unread.
    async fn append_message(&self, contact: &ContactId, draft: MessageDraft) -> Result<Message>;

    /// Set the read flag. Idempotent; a no-op when the conversation or
    /// message is absent.
    async fn mark_read(&self, contact: &ContactId, message: &MessageId) -> Result<()>;

    /// Replace the body (plaintext and obfuscated twin) and set the edited
    /// flag. Returns `None` when the message does not exist.
    async fn edit_message(
        &self,
        contact: &ContactId,
        message: &MessageId,
        new_text: &str,
    ) -> Result<Option<Message>>;

    /// Tombstone a message: clear both bodies, set the deleted flag, and
    /// force the kind back to text. Idempotent.
    async fn delete_message(&self, contact: &ContactId, message: &MessageId) -> Result<()>;

    /// The singleton user profile (a default record on first run).
    async fn profile(&self) -> Result<UserProfile>;

    /// Persist the profile immediately.
    async fn save_profile(&self, profile: &UserProfile) -> Result<()>;
}

#[async_trait]
impl<T: ConversationStore + ?Sized> ConversationStore for std::sync::Arc<T> {
    async fn list_messages(&self, contact: &ContactId) -> Result<Vec<Message>> {
        (**self).list_messages(contact).await
    }

    async fn append_message(&self, contact: &ContactId, draft: MessageDraft) -> Result<Message> {
        (**self).append_message(contact, draft).await
    }

    async fn mark_read(&self, contact: &ContactId, message: &MessageId) -> Result<()> {
        (**self).mark_read(contact, message).await
    }

    async fn edit_message(
        &self,
        contact: &ContactId,
        message: &MessageId,
        new_text: &str,
    ) -> Result<Option<Message>> {
        (**self).edit_message(contact, message, new_text).await
    }

    async fn delete_message(&self, contact: &ContactId, message: &MessageId) -> Result<()> {
        (**self).delete_message(contact, message).await
    }

    async fn profile(&self) -> Result<UserProfile> {
        (**self).profile().await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        (**self).save_profile(profile).await
    }
}

/// Seed a welcome message into every empty conversation.
///
/// Runs once per contact lifetime: conversations that already hold
/// messages are left untouched.
pub async fn ensure_seeded<S: ConversationStore + ?Sized>(
    store: &S,
    contacts: &[Contact],
) -> Result<()> {
    for contact in contacts {
        if store.list_messages(&contact.id).await?.is_empty() {
            let welcome = format!(
                "This is the beginning of your encrypted conversation with {}.",
                contact.name
            );
            store
                .append_message(&contact.id, MessageDraft::text(Sender::Them, welcome))
                .await?;
            tracing::debug!(contact = %contact.id, "Seeded welcome message");
        }
    }
    Ok(())
}

/// Turn a draft into a stored record: fresh id, store timestamp, and the
/// convention that counterparty messages arrive already read.
pub(crate) fn materialize(draft: MessageDraft) -> Message {
    Message {
        id: MessageId::new(Uuid::new_v4().to_string()),
        sender: draft.sender,
        text: draft.text,
        obfuscated_text: draft.obfuscated_text,
        timestamp: Utc::now(),
        kind: draft.kind,
        read: draft.sender == Sender::Them,
        deleted: false,
        edited: false,
        uploading: false,
    }
}

/// In-place edit of a stored message.
pub(crate) fn apply_edit(message: &mut Message, new_text: &str) {
    message.text = new_text.to_string();
    message.obfuscated_text = confab_shared::cipher::obfuscate(new_text);
    message.edited = true;
}

/// In-place tombstone of a stored message.
pub(crate) fn apply_delete(message: &mut Message) {
    message.text.clear();
    message.obfuscated_text.clear();
    message.deleted = true;
    message.kind = MessageKind::Text;
}
