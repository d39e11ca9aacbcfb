//! The conversation session controller.
//!
//! [`ChatSession`] owns the in-memory view of the one active conversation
//! and mediates every user action: sends go to the store and appear
//! immediately, file uploads show an optimistic placeholder until the
//! simulated upload lands, edits and deletes reconcile the view against
//! what the store confirms, and each outgoing message triggers a delayed
//! read receipt plus a roleplay reply from the oracle.
//!
//! Continuation hygiene: every conversation switch bumps an epoch, and
//! every in-flight continuation carries the epoch (or contact id) it was
//! issued for. A continuation whose target no longer matches drops its
//! view effect instead of resurrecting stale state; its store effect, if
//! any, still lands in the conversation it was issued for.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use confab_oracle::ReplyOracle;
use confab_shared::constants::{REPLY_FALLBACK, SUGGESTION_FALLBACK};
use confab_shared::types::{ContactId, MessageId, MessageKind, Sender};
use confab_store::{
    ensure_seeded, Contact, ConversationStore, Message, MessageDraft, UserProfile,
};

use crate::call::{CallPhase, CallState};
use crate::config::Timing;
use crate::error::{Result, SessionError};

/// Mutable view state behind the session's lock.
#[derive(Debug)]
pub(crate) struct SessionView {
    pub(crate) contacts: Vec<Contact>,
    pub(crate) selected: Option<ContactId>,
    /// Bumped on every conversation switch; continuations compare it to
    /// decide whether their view effect is still wanted.
    pub(crate) epoch: u64,
    pub(crate) messages: Vec<Message>,
    pub(crate) loading: bool,
    pub(crate) profile: UserProfile,
}

/// The session controller. Cheap to clone; all clones share state.
pub struct ChatSession<S, O> {
    store: Arc<S>,
    oracle: Arc<O>,
    timing: Timing,
    pub(crate) view: Arc<Mutex<SessionView>>,
    call: Arc<Mutex<CallState>>,
}

impl<S, O> Clone for ChatSession<S, O> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            oracle: self.oracle.clone(),
            timing: self.timing.clone(),
            view: self.view.clone(),
            call: self.call.clone(),
        }
    }
}

impl<S, O> ChatSession<S, O>
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    pub fn new(store: S, oracle: O, contacts: Vec<Contact>, timing: Timing) -> Self {
        Self {
            store: Arc::new(store),
            oracle: Arc::new(oracle),
            timing,
            view: Arc::new(Mutex::new(SessionView {
                contacts,
                selected: None,
                epoch: 0,
                messages: Vec::new(),
                loading: false,
                profile: UserProfile::default(),
            })),
            call: Arc::new(Mutex::new(CallState::new())),
        }
    }

    /// First-run setup: seed welcome messages into empty conversations
    /// and load the persisted profile.
    pub async fn bootstrap(&self) -> Result<()> {
        let contacts = self.contacts().await;
        ensure_seeded(self.store.as_ref(), &contacts).await?;
        let profile = self.store.profile().await?;
        self.view.lock().await.profile = profile;
        Ok(())
    }

    // -- view snapshots ----------------------------------------------------

    pub async fn contacts(&self) -> Vec<Contact> {
        self.view.lock().await.contacts.clone()
    }

    pub async fn selected_contact(&self) -> Option<Contact> {
        let view = self.view.lock().await;
        let selected = view.selected.as_ref()?;
        view.contacts.iter().find(|c| &c.id == selected).cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.view.lock().await.messages.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.view.lock().await.loading
    }

    pub async fn profile(&self) -> UserProfile {
        self.view.lock().await.profile.clone()
    }

    pub async fn call_phase(&self) -> CallPhase {
        self.call.lock().await.phase().clone()
    }

    // -- conversation selection --------------------------------------------

    /// Open a contact's conversation, replacing the previous view.
    ///
    /// Bumps the epoch so continuations aimed at the old conversation
    /// drop their view effects.
    pub async fn select_contact(&self, id: &ContactId) -> Result<Vec<Message>> {
        let epoch = {
            let mut view = self.view.lock().await;
            if !view.contacts.iter().any(|c| &c.id == id) {
                return Err(SessionError::UnknownContact(id.clone()));
            }
            view.selected = Some(id.clone());
            view.epoch += 1;
            view.messages.clear();
            view.loading = false;
            view.epoch
        };

        let messages = self.store.list_messages(id).await?;
        let mut view = self.view.lock().await;
        if view.epoch == epoch {
            view.messages = messages.clone();
        }
        debug!(contact = %id, count = messages.len(), "Conversation opened");
        Ok(messages)
    }

    /// Close the active conversation, if any.
    pub async fn deselect(&self) {
        let mut view = self.view.lock().await;
        view.selected = None;
        view.epoch += 1;
        view.messages.clear();
        view.loading = false;
    }

    // -- sending -----------------------------------------------------------

    /// Send a text message to the selected contact.
    ///
    /// The stored message is returned (and visible) immediately; a read
    /// receipt and a roleplay reply follow on their own schedules. The
    /// loading flag stays up until the reply settles.
    pub async fn send_text(&self, text: &str) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyDraft);
        }

        let (contact, contact_name, epoch) = self.begin_exchange().await?;

        let stored = match self
            .store
            .append_message(&contact, MessageDraft::text(Sender::Me, text))
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                self.settle_loading(epoch).await;
                return Err(e.into());
            }
        };

        {
            let mut view = self.view.lock().await;
            if view.epoch == epoch {
                view.messages.push(stored.clone());
            }
        }

        self.spawn_read_receipt(contact.clone(), stored.id.clone(), self.timing.read_receipt);
        self.spawn_roleplay(contact, contact_name, epoch);
        debug!(message = %stored.id, "Text message sent");
        Ok(stored)
    }

    /// Start a file send to the selected contact.
    ///
    /// An optimistic `uploading` placeholder appears immediately under the
    /// returned temporary id and is never persisted; once the simulated
    /// upload finishes, the store-confirmed message replaces it in place,
    /// and the read-receipt/roleplay flow runs as for a text send.
    pub async fn send_file(&self, file_name: &str) -> Result<MessageId> {
        let (contact, contact_name, epoch) = self.begin_exchange_without_loading().await?;

        let temp_id = MessageId::new(format!("upload-{}", Uuid::new_v4()));
        let text = format!("File: {file_name}");
        let placeholder = Message {
            id: temp_id.clone(),
            sender: Sender::Me,
            obfuscated_text: confab_shared::cipher::obfuscate(&text),
            text,
            timestamp: Utc::now(),
            kind: MessageKind::File {
                file_name: file_name.to_string(),
            },
            read: false,
            deleted: false,
            edited: false,
            uploading: true,
        };

        {
            let mut view = self.view.lock().await;
            if view.epoch == epoch {
                view.messages.push(placeholder);
            }
        }

        let session = self.clone();
        let file_name = file_name.to_string();
        let returned_id = temp_id.clone();
        tokio::spawn(async move {
            session
                .finish_file_send(contact, contact_name, epoch, temp_id, file_name)
                .await;
        });
        Ok(returned_id)
    }

    async fn finish_file_send(
        &self,
        contact: ContactId,
        contact_name: String,
        epoch: u64,
        temp_id: MessageId,
        file_name: String,
    ) {
        tokio::time::sleep(self.timing.upload).await;

        // The upload still completes if the user navigated away; it was
        // issued for this contact and lands in this contact's history.
        let stored = match self
            .store
            .append_message(&contact, MessageDraft::file(Sender::Me, file_name))
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                warn!(contact = %contact, error = %e, "File upload failed");
                let mut view = self.view.lock().await;
                if view.epoch == epoch {
                    view.messages.retain(|m| m.id != temp_id);
                }
                return;
            }
        };

        {
            let mut view = self.view.lock().await;
            if view.epoch == epoch {
                if let Some(slot) = view.messages.iter_mut().find(|m| m.id == temp_id) {
                    *slot = stored.clone();
                }
                view.loading = true;
            }
        }

        self.spawn_read_receipt(
            contact.clone(),
            stored.id.clone(),
            self.timing.file_read_receipt,
        );
        self.deliver_roleplay(contact, contact_name, epoch).await;
    }

    // -- editing -----------------------------------------------------------

    /// Edit a message in the selected conversation.
    ///
    /// Returns `None` (and changes nothing) when the id no longer exists.
    pub async fn edit_message(
        &self,
        message: &MessageId,
        new_text: &str,
    ) -> Result<Option<Message>> {
        let contact = self.selected_id().await?;
        let updated = self.store.edit_message(&contact, message, new_text).await?;
        if let Some(ref updated) = updated {
            let mut view = self.view.lock().await;
            if view.selected.as_ref() == Some(&contact) {
                if let Some(slot) = view.messages.iter_mut().find(|m| &m.id == message) {
                    *slot = updated.clone();
                }
            }
        }
        Ok(updated)
    }

    /// Tombstone a message in the selected conversation. Idempotent; the
    /// entry stays in place with empty bodies and text kind.
    pub async fn delete_message(&self, message: &MessageId) -> Result<()> {
        let contact = self.selected_id().await?;
        self.store.delete_message(&contact, message).await?;
        let mut view = self.view.lock().await;
        if view.selected.as_ref() == Some(&contact) {
            if let Some(slot) = view.messages.iter_mut().find(|m| &m.id == message) {
                slot.text.clear();
                slot.obfuscated_text.clear();
                slot.deleted = true;
                slot.kind = MessageKind::Text;
            }
        }
        Ok(())
    }

    // -- oracle-assisted composition ----------------------------------------

    /// One completion for the user's unsent draft.
    ///
    /// Oracle failures degrade to a fixed "couldn't generate" line; the
    /// only error here is having no conversation open.
    pub async fn suggest_reply(&self, draft: &str) -> Result<String> {
        let (history, epoch) = {
            let mut view = self.view.lock().await;
            if view.selected.is_none() {
                return Err(SessionError::NoContactSelected);
            }
            view.loading = true;
            (view.messages.clone(), view.epoch)
        };

        let suggestion = match self.oracle.suggest(&history, draft).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Suggestion failed, degrading to fallback");
                SUGGESTION_FALLBACK.to_string()
            }
        };
        self.settle_loading(epoch).await;
        Ok(suggestion)
    }

    // -- profile -----------------------------------------------------------

    /// Update the display name and persist it immediately.
    pub async fn update_profile(&self, name: &str) -> Result<UserProfile> {
        let profile = UserProfile {
            name: name.to_string(),
        };
        self.store.save_profile(&profile).await?;
        self.view.lock().await.profile = profile.clone();
        info!(name = %profile.name, "Profile updated");
        Ok(profile)
    }

    // -- calls --------------------------------------------------------------

    /// Ring the selected contact. Rejected while another call is active.
    ///
    /// The call auto-connects after the configured delay unless it has
    /// been hung up first.
    pub async fn start_call(&self) -> Result<Contact> {
        let contact = self
            .selected_contact()
            .await
            .ok_or(SessionError::NoContactSelected)?;

        let generation = self.call.lock().await.begin(contact.clone())?;
        info!(contact = %contact.id, "Call ringing");

        let call = self.call.clone();
        let delay = self.timing.call_connect;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if call.lock().await.connect(generation) {
                info!("Call connected");
            }
        });
        Ok(contact)
    }

    /// Hang up.
    ///
    /// A connected call leaves one call-summary message in the original
    /// target's conversation (even if another contact is open by now) and
    /// that message is returned. Hanging up while still ringing, or with
    /// no call at all, appends nothing.
    pub async fn end_call(&self) -> Result<Option<Message>> {
        let Some(summary) = self.call.lock().await.hang_up() else {
            return Ok(None);
        };
        let Some(duration_secs) = summary.duration_secs else {
            info!(contact = %summary.contact.id, "Call abandoned before connecting");
            return Ok(None);
        };

        let stored = self
            .store
            .append_message(&summary.contact.id, MessageDraft::call(duration_secs))
            .await?;
        {
            let mut view = self.view.lock().await;
            if view.selected.as_ref() == Some(&summary.contact.id) {
                view.messages.push(stored.clone());
            }
        }
        info!(contact = %summary.contact.id, duration_secs, "Call ended");
        Ok(Some(stored))
    }

    // -- internals ----------------------------------------------------------

    async fn selected_id(&self) -> Result<ContactId> {
        self.view
            .lock()
            .await
            .selected
            .clone()
            .ok_or(SessionError::NoContactSelected)
    }

    /// Capture the exchange context (contact, display name, epoch) and
    /// raise the loading flag.
    async fn begin_exchange(&self) -> Result<(ContactId, String, u64)> {
        let mut view = self.view.lock().await;
        let Some(contact) = view.selected.clone() else {
            return Err(SessionError::NoContactSelected);
        };
        let name = view
            .contacts
            .iter()
            .find(|c| c.id == contact)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        view.loading = true;
        Ok((contact, name, view.epoch))
    }

    /// Same capture without the loading flag; file sends raise it only
    /// once the upload has landed.
    async fn begin_exchange_without_loading(&self) -> Result<(ContactId, String, u64)> {
        let view = self.view.lock().await;
        let Some(contact) = view.selected.clone() else {
            return Err(SessionError::NoContactSelected);
        };
        let name = view
            .contacts
            .iter()
            .find(|c| c.id == contact)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Ok((contact, name, view.epoch))
    }

    async fn settle_loading(&self, epoch: u64) {
        let mut view = self.view.lock().await;
        if view.epoch == epoch {
            view.loading = false;
        }
    }

    /// After `delay`, mark the message read in the store and, if the
    /// conversation is still on screen, in the view.
    fn spawn_read_receipt(&self, contact: ContactId, message: MessageId, delay: Duration) {
        let store = self.store.clone();
        let view = self.view.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = store.mark_read(&contact, &message).await {
                warn!(contact = %contact, message = %message, error = %e, "Read receipt failed");
                return;
            }
            let mut view = view.lock().await;
            if view.selected.as_ref() == Some(&contact) {
                if let Some(msg) = view.messages.iter_mut().find(|m| m.id == message) {
                    msg.read = true;
                }
            }
        });
    }

    fn spawn_roleplay(&self, contact: ContactId, contact_name: String, epoch: u64) {
        let session = self.clone();
        tokio::spawn(async move {
            session.deliver_roleplay(contact, contact_name, epoch).await;
        });
    }

    /// Ask the oracle for a counterparty reply and append it to the
    /// conversation the exchange was issued for. The reply reaches the
    /// view only when that conversation is still the one on screen
    /// (unchanged epoch); otherwise the store keeps it and the next open
    /// shows it.
    async fn deliver_roleplay(&self, contact: ContactId, contact_name: String, epoch: u64) {
        let history = match self.store.list_messages(&contact).await {
            Ok(history) => history,
            Err(e) => {
                warn!(contact = %contact, error = %e, "Could not load history for reply");
                self.settle_loading(epoch).await;
                return;
            }
        };

        let reply = match self.oracle.roleplay_reply(&history, &contact_name).await {
            Ok(text) => text,
            Err(e) => {
                warn!(contact = %contact, error = %e, "Reply oracle failed, using fallback");
                REPLY_FALLBACK.to_string()
            }
        };

        match self
            .store
            .append_message(&contact, MessageDraft::text(Sender::Them, reply))
            .await
        {
            Ok(stored) => {
                let mut view = self.view.lock().await;
                if view.epoch == epoch {
                    view.messages.push(stored);
                    view.loading = false;
                } else {
                    debug!(contact = %contact, "Conversation changed, reply kept in store only");
                }
            }
            Err(e) => {
                warn!(contact = %contact, error = %e, "Could not store reply");
                self.settle_loading(epoch).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use confab_oracle::ScriptedOracle;
    use confab_shared::constants::{REPLY_FALLBACK, SUGGESTION_FALLBACK};
    use confab_shared::{cipher, types::Presence};
    use confab_store::MemoryStore;

    const ALICE: &str = "contact-1";
    const BOB: &str = "contact-2";

    fn alice() -> ContactId {
        ContactId::new(ALICE)
    }

    fn bob() -> ContactId {
        ContactId::new(BOB)
    }

    fn contacts() -> Vec<Contact> {
        vec![
            Contact::online(ALICE, "Alice"),
            Contact::offline(BOB, "Bob", Utc::now()),
        ]
    }

    /// Seeded session over a shared in-memory store and a scripted oracle,
    /// with the default (simulated) delays driven by the paused clock.
    async fn seeded_session(
    ) -> ChatSession<Arc<MemoryStore>, Arc<ScriptedOracle>> {
        let session = ChatSession::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedOracle::new()),
            contacts(),
            Timing::default(),
        );
        session.bootstrap().await.unwrap();
        session
    }

    fn oracle_of(
        session: &ChatSession<Arc<MemoryStore>, Arc<ScriptedOracle>>,
    ) -> Arc<ScriptedOracle> {
        session.oracle.as_ref().clone()
    }

    /// Long enough (on the paused clock) for every default delay to fire.
    async fn settle() {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_text_appends_one_local_and_one_reply() {
        let session = seeded_session().await;
        oracle_of(&session).push_reply("hey yourself");
        session.select_contact(&alice()).await.unwrap();

        let sent = session.send_text("hello").await.unwrap();
        assert_eq!(sent.sender, Sender::Me);
        assert!(!sent.read, "own messages start unread");
        assert!(session.is_loading().await, "loading spans send to reply");
        assert_eq!(session.messages().await.len(), 2, "welcome + sent, shown immediately");

        settle().await;

        let messages = session.messages().await;
        assert_eq!(messages.len(), 3, "welcome + sent + exactly one reply");
        assert_eq!(messages[1].id, sent.id);
        assert!(messages[1].read, "read receipt landed");
        assert_eq!(messages[2].sender, Sender::Them);
        assert_eq!(messages[2].text, "hey yourself");
        assert!(!session.is_loading().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_text_oracle_failure_degrades_to_fallback() {
        let session = seeded_session().await;
        oracle_of(&session).set_failing(true);
        session.select_contact(&alice()).await.unwrap();

        session.send_text("anyone there?").await.unwrap();
        settle().await;

        let messages = session.messages().await;
        let reply = messages.last().unwrap();
        assert_eq!(reply.sender, Sender::Them);
        assert_eq!(reply.text, REPLY_FALLBACK);
        assert!(!session.is_loading().await, "fallback still settles loading");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_conversation_send_hello_scenario() {
        // Unseeded store: Alice's conversation starts empty.
        let session = ChatSession::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedOracle::new()),
            contacts(),
            Timing::default(),
        );
        oracle_of(&session).push_reply("hi! how are you?");
        assert!(session.select_contact(&alice()).await.unwrap().is_empty());

        session.send_text("hello").await.unwrap();
        settle().await;

        let messages = session.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::Me);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].sender, Sender::Them);
        for msg in &messages {
            assert!(!msg.obfuscated_text.is_empty());
            assert_eq!(cipher::reveal(&msg.obfuscated_text), msg.text);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_requires_selection_and_nonblank_text() {
        let session = seeded_session().await;
        assert!(matches!(
            session.send_text("hello").await,
            Err(SessionError::NoContactSelected)
        ));

        session.select_contact(&alice()).await.unwrap();
        assert!(matches!(
            session.send_text("   ").await,
            Err(SessionError::EmptyDraft)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_send_upload_then_read_transition() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();

        let temp_id = session.send_file("vacation.jpg").await.unwrap();

        let placeholder = session.messages().await.last().cloned().unwrap();
        assert_eq!(placeholder.id, temp_id);
        assert!(placeholder.uploading);
        assert!(!placeholder.read);
        assert_eq!(
            placeholder.kind,
            MessageKind::File {
                file_name: "vacation.jpg".to_string()
            }
        );

        // Past the 2.5s upload, before the 1s file read receipt.
        tokio::time::sleep(Duration::from_millis(2_600)).await;
        let messages = session.messages().await;
        let file_msgs: Vec<_> = messages
            .iter()
            .filter(|m| matches!(m.kind, MessageKind::File { .. }))
            .collect();
        assert_eq!(file_msgs.len(), 1, "placeholder replaced in place, not duplicated");
        let delivered = file_msgs[0];
        assert!(!delivered.uploading, "upload finished");
        assert!(!delivered.read, "not yet read");
        assert_ne!(delivered.id, temp_id, "store id replaces the temp id");

        settle().await;
        let messages = session.messages().await;
        let delivered = messages
            .iter()
            .find(|m| matches!(m.kind, MessageKind::File { .. }))
            .unwrap();
        assert!(delivered.read, "read receipt follows delivery");
        assert_eq!(
            messages.last().unwrap().sender,
            Sender::Them,
            "file send also draws a reply"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_is_idempotent_tombstone() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();
        let sent = session.send_text("take this back").await.unwrap();
        settle().await;

        session.delete_message(&sent.id).await.unwrap();
        session.delete_message(&sent.id).await.unwrap();

        let messages = session.messages().await;
        let tombstone = messages.iter().find(|m| m.id == sent.id).unwrap();
        assert!(tombstone.deleted);
        assert!(tombstone.text.is_empty());
        assert!(tombstone.obfuscated_text.is_empty());
        assert_eq!(tombstone.kind, MessageKind::Text);
        assert_eq!(messages.len(), 3, "tombstone keeps its slot");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_unknown_id_changes_nothing() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();
        let before = session.messages().await;

        let result = session
            .edit_message(&MessageId::new("ghost"), "boo")
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(session.messages().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_replaces_in_view_and_store() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();
        let sent = session.send_text("teh message").await.unwrap();
        settle().await;

        let updated = session
            .edit_message(&sent.id, "the message")
            .await
            .unwrap()
            .unwrap();
        assert!(updated.edited);
        assert_eq!(cipher::reveal(&updated.obfuscated_text), "the message");

        let shown = session
            .messages()
            .await
            .into_iter()
            .find(|m| m.id == sent.id)
            .unwrap();
        assert_eq!(shown.text, "the message");

        // Survives a reload from the store.
        let reloaded = session.select_contact(&alice()).await.unwrap();
        assert!(reloaded.iter().any(|m| m.id == sent.id && m.edited));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_contacts_discards_stale_reply_from_view() {
        let session = seeded_session().await;
        let oracle = oracle_of(&session);
        oracle.push_reply("too late");
        oracle.set_delay(Duration::from_secs(5));

        session.select_contact(&alice()).await.unwrap();
        session.send_text("hi alice").await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        session.select_contact(&bob()).await.unwrap();
        settle().await;

        let bob_messages = session.messages().await;
        assert!(
            bob_messages.iter().all(|m| m.text != "too late"),
            "a reply issued for Alice never lands in Bob's view"
        );
        assert!(!session.is_loading().await);

        // The reply was delivered to Alice's conversation in the store.
        let alice_messages = session.select_contact(&alice()).await.unwrap();
        assert!(alice_messages.iter().any(|m| m.text == "too late"));
        // The read receipt issued before the switch also reached the store.
        assert!(alice_messages
            .iter()
            .any(|m| m.text == "hi alice" && m.read));
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestion_fallback_and_selection_guard() {
        let session = seeded_session().await;
        assert!(matches!(
            session.suggest_reply("dra").await,
            Err(SessionError::NoContactSelected)
        ));

        session.select_contact(&alice()).await.unwrap();
        oracle_of(&session).push_suggestion("draft beer sounds great");
        assert_eq!(
            session.suggest_reply("dra").await.unwrap(),
            "draft beer sounds great"
        );

        oracle_of(&session).set_failing(true);
        assert_eq!(session.suggest_reply("dra").await.unwrap(), SUGGESTION_FALLBACK);
        assert!(!session.is_loading().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_rings_connects_and_logs_summary() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();

        let target = session.start_call().await.unwrap();
        assert_eq!(target.id, alice());
        assert_eq!(session.call_phase().await, CallPhase::Ringing);
        assert!(matches!(
            session.start_call().await,
            Err(SessionError::CallInProgress)
        ));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(matches!(
            session.call_phase().await,
            CallPhase::Connected { .. }
        ));

        let summary = session.end_call().await.unwrap().unwrap();
        match summary.kind {
            MessageKind::Call { duration_secs } => assert!(duration_secs < 60),
            ref other => panic!("expected call message, got {other:?}"),
        }
        assert_eq!(session.call_phase().await, CallPhase::Idle);
        assert_eq!(session.messages().await.last().unwrap().id, summary.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hangup_before_connect_appends_nothing() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();
        let before = session.messages().await;

        session.start_call().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(session.end_call().await.unwrap().is_none());
        assert_eq!(session.call_phase().await, CallPhase::Idle);

        // The auto-connect timer from the abandoned call must not fire.
        settle().await;
        assert_eq!(session.call_phase().await, CallPhase::Idle);
        assert_eq!(session.messages().await, before);

        // And ending with no call at all is a quiet no-op.
        assert!(session.end_call().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_summary_targets_original_contact_after_switch() {
        let session = seeded_session().await;
        session.select_contact(&alice()).await.unwrap();
        session.start_call().await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;

        session.select_contact(&bob()).await.unwrap();
        let summary = session.end_call().await.unwrap().unwrap();

        let bob_messages = session.messages().await;
        assert!(
            !bob_messages.iter().any(|m| m.id == summary.id),
            "Bob's view stays clear of Alice's call summary"
        );

        let alice_messages = session.select_contact(&alice()).await.unwrap();
        assert!(alice_messages.iter().any(|m| m.id == summary.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_update_persists_immediately() {
        let store = Arc::new(MemoryStore::new());
        let session = ChatSession::new(
            store.clone(),
            Arc::new(ScriptedOracle::new()),
            contacts(),
            Timing::default(),
        );
        session.bootstrap().await.unwrap();
        assert_eq!(session.profile().await.name, "You");

        session.update_profile("Ada").await.unwrap();
        assert_eq!(session.profile().await.name, "Ada");
        assert_eq!(store.profile().await.unwrap().name, "Ada");
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_unknown_contact_is_rejected() {
        let session = seeded_session().await;
        assert!(matches!(
            session.select_contact(&ContactId::new("nobody")).await,
            Err(SessionError::UnknownContact(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_seeds_welcome_once() {
        let session = seeded_session().await;
        session.bootstrap().await.unwrap();

        let messages = session.select_contact(&alice()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("Alice"));
        assert!(messages[0].read);
        assert!(matches!(
            session.contacts().await[0].presence,
            Presence::Online
        ));
    }
}
