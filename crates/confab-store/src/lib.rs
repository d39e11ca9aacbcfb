//! # confab-store
//!
//! Mock persistence for confab conversations and the user profile.
//!
//! The backend is deliberately modest: two logical tables (conversations
//! keyed by contact id, plus a singleton profile record) serialized as
//! whole JSON blobs on every write and re-read wholesale on every load,
//! with a configurable artificial latency on each call to emulate a
//! network round trip.
//!
//! Consumers depend on the [`ConversationStore`] trait, not on a concrete
//! backend, so tests swap in [`MemoryStore`] while the demo binary uses
//! the file-backed [`JsonStore`].

pub mod json;
pub mod memory;
pub mod models;
pub mod store;

mod error;

pub use error::StoreError;
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use models::*;
pub use store::{ensure_seeded, ConversationStore};
