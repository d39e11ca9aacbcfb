//! # confab-shared
//!
//! Types and helpers shared by every confab crate: opaque identifiers,
//! the message/presence tagged unions, tunable constants, and the
//! reversible obfuscation codec that produces each message's "encrypted"
//! twin.
//!
//! Nothing in this crate touches the network or the filesystem.

pub mod cipher;
pub mod constants;
pub mod types;
