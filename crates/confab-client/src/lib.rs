//! # confab-client
//!
//! The conversation session controller and its satellites: the call
//! lifecycle tracker, the background presence simulator, and the demo
//! binary's configuration.
//!
//! [`session::ChatSession`] holds the in-memory view of the one active
//! conversation, applies optimistic local updates for sends, uploads,
//! edits and deletes, reconciles them against what the store confirms,
//! and drives the reply oracle at the right points in the exchange.
//! Every delayed continuation (read receipts, call auto-connect, roleplay
//! replies) checks that its target conversation or call still exists
//! before touching visible state, so nothing stale is ever resurrected.

pub mod call;
pub mod config;
pub mod presence;
pub mod session;

mod error;

pub use call::{CallPhase, CallState};
pub use config::{Config, Timing};
pub use error::SessionError;
pub use session::ChatSession;
