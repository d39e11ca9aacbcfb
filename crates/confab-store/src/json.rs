//! File-backed [`ConversationStore`] using whole-blob JSON tables.
//!
//! Two files live under the data directory:
//!
//! - `conversations.json`: map from contact id to its ordered message list
//! - `profile.json`: the singleton user profile
//!
//! Every read deserializes the whole table and every write rewrites it,
//! which is fine at mock scale. Each rewrite goes through a temp file and
//! an atomic rename so a crash never leaves a half-written table behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::sync::Mutex;

use confab_shared::types::{ContactId, MessageId};

use crate::error::{Result, StoreError};
use crate::models::{Message, MessageDraft, UserProfile};
use crate::store::{self, ConversationStore};

const CONVERSATIONS_TABLE: &str = "conversations.json";
const PROFILE_TABLE: &str = "profile.json";

type Conversations = HashMap<String, Vec<Message>>;

/// JSON-file store with simulated per-call latency.
pub struct JsonStore {
    dir: PathBuf,
    latency: Duration,
    // Serializes read-modify-write cycles on the table files.
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Open (or create) the store in the platform data directory,
    /// e.g. `~/.local/share/confab/` on Linux.
    pub fn new(latency: Duration) -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("dev", "confab", "confab").ok_or(StoreError::NoDataDir)?;
        Self::open_at(project_dirs.data_dir(), latency)
    }

    /// Open (or create) the store at an explicit directory.
    ///
    /// Useful for tests and custom layouts.
    pub fn open_at(dir: &Path, latency: Duration) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        tracing::info!(path = %dir.display(), "Opening JSON store");
        Ok(Self {
            dir: dir.to_path_buf(),
            latency,
            write_lock: Mutex::new(()),
        })
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn load_conversations(&self) -> Result<Conversations> {
        self.load_table(CONVERSATIONS_TABLE).await
    }

    async fn save_conversations(&self, table: &Conversations) -> Result<()> {
        self.save_table(CONVERSATIONS_TABLE, table).await
    }

    async fn load_table<T: serde::de::DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_table<T: serde::Serialize>(&self, name: &str, table: &T) -> Result<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        let bytes = serde_json::to_vec_pretty(table)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for JsonStore {
    async fn list_messages(&self, contact: &ContactId) -> Result<Vec<Message>> {
        self.simulate_latency().await;
        let conversations = self.load_conversations().await?;
        Ok(conversations
            .get(contact.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn append_message(&self, contact: &ContactId, draft: MessageDraft) -> Result<Message> {
        self.simulate_latency().await;
        let _guard = self.write_lock.lock().await;
        let mut conversations = self.load_conversations().await?;
        let message = store::materialize(draft);
        conversations
            .entry(contact.as_str().to_string())
            .or_default()
            .push(message.clone());
        self.save_conversations(&conversations).await?;
        tracing::debug!(contact = %contact, message = %message.id, "Appended message");
        Ok(message)
    }

    async fn mark_read(&self, contact: &ContactId, message: &MessageId) -> Result<()> {
        self.simulate_latency().await;
        let _guard = self.write_lock.lock().await;
        let mut conversations = self.load_conversations().await?;
        if let Some(messages) = conversations.get_mut(contact.as_str()) {
            if let Some(msg) = messages.iter_mut().find(|m| &m.id == message) {
                msg.read = true;
                self.save_conversations(&conversations).await?;
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
        let _guard = self.write_lock.lock().await;
        let mut conversations = self.load_conversations().await?;
        let Some(msg) = conversations
            .get_mut(contact.as_str())
            .and_then(|messages| messages.iter_mut().find(|m| &m.id == message))
        else {
            return Ok(None);
        };
        store::apply_edit(msg, new_text);
        let edited = msg.clone();
        self.save_conversations(&conversations).await?;
        Ok(Some(edited))
    }

    async fn delete_message(&self, contact: &ContactId, message: &MessageId) -> Result<()> {
        self.simulate_latency().await;
        let _guard = self.write_lock.lock().await;
        let mut conversations = self.load_conversations().await?;
        if let Some(msg) = conversations
            .get_mut(contact.as_str())
            .and_then(|messages| messages.iter_mut().find(|m| &m.id == message))
        {
            store::apply_delete(msg);
            self.save_conversations(&conversations).await?;
        }
        Ok(())
    }

    async fn profile(&self) -> Result<UserProfile> {
        self.simulate_latency().await;
        let profile: Option<UserProfile> = self.load_table(PROFILE_TABLE).await?;
        Ok(profile.unwrap_or_default())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.simulate_latency().await;
        let _guard = self.write_lock.lock().await;
        self.save_table(PROFILE_TABLE, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_shared::types::Sender;

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open_at(dir.path(), Duration::ZERO).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_messages_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let contact = ContactId::new("contact-1");

        let id = {
            let store = JsonStore::open_at(dir.path(), Duration::ZERO).unwrap();
            store
                .append_message(&contact, MessageDraft::text(Sender::Me, "persist me"))
                .await
                .unwrap()
                .id
        };

        let store = JsonStore::open_at(dir.path(), Duration::ZERO).unwrap();
        let messages = store.list_messages(&contact).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, id);
        assert_eq!(messages[0].text, "persist me");
        assert!(!messages[0].read);
    }

    #[tokio::test]
    async fn test_profile_roundtrip_and_default() {
        let (_dir, store) = temp_store();
        assert_eq!(store.profile().await.unwrap(), UserProfile::default());

        store
            .save_profile(&UserProfile {
                name: "Grace".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(store.profile().await.unwrap().name, "Grace");
    }

    #[tokio::test]
    async fn test_edit_and_delete_rewrite_table() {
        let (_dir, store) = temp_store();
        let contact = ContactId::new("contact-1");

        let msg = store
            .append_message(&contact, MessageDraft::text(Sender::Me, "draft"))
            .await
            .unwrap();

        let edited = store
            .edit_message(&contact, &msg.id, "final")
            .await
            .unwrap()
            .unwrap();
        assert!(edited.edited);

        store.delete_message(&contact, &msg.id).await.unwrap();
        let messages = store.list_messages(&contact).await.unwrap();
        assert!(messages[0].deleted);
        assert!(messages[0].text.is_empty());
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_none_and_leaves_file_alone() {
        let (_dir, store) = temp_store();
        let contact = ContactId::new("contact-1");
        store
            .append_message(&contact, MessageDraft::text(Sender::Me, "hi"))
            .await
            .unwrap();

        let result = store
            .edit_message(&contact, &MessageId::new("ghost"), "boo")
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.list_messages(&contact).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_uploading_flag_is_never_persisted() {
        let (_dir, store) = temp_store();
        let contact = ContactId::new("contact-1");
        let stored = store
            .append_message(&contact, MessageDraft::file(Sender::Me, "photo.png"))
            .await
            .unwrap();
        assert!(!stored.uploading);

        let raw = std::fs::read_to_string(_dir.path().join("conversations.json")).unwrap();
        assert!(!raw.contains("uploading"));
    }
}
