use thiserror::Error;

use confab_shared::types::ContactId;
use confab_store::StoreError;

/// Errors surfaced by the session and call controllers.
///
/// Oracle failures never appear here: the controller degrades them to
/// fixed fallback strings so the conversation stays usable.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The store rejected or failed an operation.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An operation that needs an open conversation ran without one.
    #[error("No conversation is selected")]
    NoContactSelected,

    /// The contact id does not match any known contact.
    #[error("Unknown contact: {0}")]
    UnknownContact(ContactId),

    /// `start_call` while a call is already ringing or connected.
    #[error("A call is already in progress")]
    CallInProgress,

    /// Blank text handed to `send_text`.
    #[error("Cannot send an empty message")]
    EmptyDraft,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionError>;
