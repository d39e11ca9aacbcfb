//! # confab-oracle
//!
//! The reply oracle: an external text-completion capability that produces
//! (a) autocomplete suggestions for the user's unsent draft and (b) whole
//! simulated replies written in the counterparty's voice.
//!
//! Oracle calls are read-only with respect to the store; the session
//! controller alone decides what to do with the returned text, and it
//! never treats an oracle failure as fatal.

pub mod http;
pub mod prompt;
pub mod scripted;

mod error;

pub use error::OracleError;
pub use http::HttpOracle;
pub use scripted::ScriptedOracle;

use async_trait::async_trait;

use confab_store::Message;

use crate::error::Result;

/// External text-generation seam.
///
/// Both calls condition on recent conversation history; the windows they
/// use are fixed in `confab_shared::constants`. Implementations may fail
/// (network, model error); callers substitute fixed fallback lines.
#[async_trait]
pub trait ReplyOracle: Send + Sync {
    /// One completion for the user's in-progress draft.
    async fn suggest(&self, history: &[Message], draft: &str) -> Result<String>;

    /// One message written as if authored by the counterparty.
    async fn roleplay_reply(&self, history: &[Message], contact_name: &str) -> Result<String>;
}

#[async_trait]
impl<T: ReplyOracle + ?Sized> ReplyOracle for std::sync::Arc<T> {
    async fn suggest(&self, history: &[Message], draft: &str) -> Result<String> {
        (**self).suggest(history, draft).await
    }

    async fn roleplay_reply(&self, history: &[Message], contact_name: &str) -> Result<String> {
        (**self).roleplay_reply(history, contact_name).await
    }
}
