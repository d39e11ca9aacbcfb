//! Domain model structs persisted in the JSON tables.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be dumped
//! into a table blob as-is; timestamps round-trip through RFC 3339 text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use confab_shared::types::{ContactId, MessageId, MessageKind, Presence, Sender};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
///
/// Deleted messages keep their id but carry empty bodies and `Text` kind;
/// they are never physically removed from the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message identifier (assigned by the store on append).
    pub id: MessageId,
    /// Who authored the message.
    pub sender: Sender,
    /// Plaintext body. Empty once deleted.
    pub text: String,
    /// Obfuscated twin of `text` (see `confab_shared::cipher`). Empty once deleted.
    pub obfuscated_text: String,
    /// When the store accepted the message.
    pub timestamp: DateTime<Utc>,
    /// Payload discriminant: text, file, or call summary.
    pub kind: MessageKind,
    /// Whether the counterparty has read it.
    pub read: bool,
    /// Tombstone flag; the entry stays in place when set.
    pub deleted: bool,
    /// Set once the body has been edited in place.
    pub edited: bool,
    /// Transient: an optimistic file message whose upload has not finished.
    /// Never true for a store-persisted message.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub uploading: bool,
}

/// What a caller hands to `append_message`; the store assigns the id,
/// the timestamp, and the initial read flag.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub sender: Sender,
    pub text: String,
    pub obfuscated_text: String,
    pub kind: MessageKind,
}

impl MessageDraft {
    /// A plain text draft, deriving the obfuscated twin from `text`.
    pub fn text(sender: Sender, text: impl Into<String>) -> Self {
        let text = text.into();
        let obfuscated_text = confab_shared::cipher::obfuscate(&text);
        Self {
            sender,
            text,
            obfuscated_text,
            kind: MessageKind::Text,
        }
    }

    /// A file draft; the body is the conventional `File: {name}` line.
    pub fn file(sender: Sender, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let text = format!("File: {file_name}");
        let obfuscated_text = confab_shared::cipher::obfuscate(&text);
        Self {
            sender,
            text,
            obfuscated_text,
            kind: MessageKind::File { file_name },
        }
    }

    /// A call-summary draft appended on hangup.
    pub fn call(duration_secs: u64) -> Self {
        let text = confab_shared::constants::CALL_ENDED_BODY.to_string();
        let obfuscated_text = confab_shared::cipher::obfuscate(&text);
        Self {
            sender: Sender::Them,
            text,
            obfuscated_text,
            kind: MessageKind::Call { duration_secs },
        }
    }
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// A known counterparty.
///
/// Presence is mutated only by the presence simulator, never by the
/// session controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub presence: Presence,
}

impl Contact {
    pub fn online(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ContactId::new(id),
            name: name.into(),
            presence: Presence::Online,
        }
    }

    pub fn offline(
        id: impl Into<String>,
        name: impl Into<String>,
        last_seen: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContactId::new(id),
            name: name.into(),
            presence: Presence::Offline { last_seen },
        }
    }
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Singleton record describing the local user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "You".to_string(),
        }
    }
}
