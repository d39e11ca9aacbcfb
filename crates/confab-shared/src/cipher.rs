//! Reversible obfuscation codec.
//!
//! Every message body gets a "ciphertext" twin produced by XORing its
//! UTF-8 bytes with a fixed key (repeated cyclically) and Base64-encoding
//! the result. The transform is self-inverse modulo the Base64 step.
//!
//! **This is not encryption.** The key is a compile-time constant, there
//! is no authentication and no key derivation, and anyone with the source
//! can reverse it. It exists so the UI can show a plausible "encrypted
//! view" of a conversation, nothing more.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::constants::{OBFUSCATION_KEY, REVEAL_FAILED};

fn xor_with_key(data: &[u8]) -> Vec<u8> {
    let key = OBFUSCATION_KEY.as_bytes();
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()])
        .collect()
}

/// Obfuscate `plaintext` into its Base64 "ciphertext" twin.
///
/// Deterministic: the same input always yields the same output.
pub fn obfuscate(plaintext: &str) -> String {
    BASE64.encode(xor_with_key(plaintext.as_bytes()))
}

/// Invert [`obfuscate`].
///
/// Round-trip law: `reveal(&obfuscate(x)) == x` for every `&str`.
///
/// Malformed input (invalid Base64, or bytes that do not XOR back to
/// UTF-8) yields the fixed [`REVEAL_FAILED`] sentinel rather than an
/// error; the caller is a display layer, not a security boundary.
pub fn reveal(ciphertext: &str) -> String {
    match try_reveal(ciphertext) {
        Some(plaintext) => plaintext,
        None => REVEAL_FAILED.to_string(),
    }
}

fn try_reveal(ciphertext: &str) -> Option<String> {
    let decoded = BASE64.decode(ciphertext).ok()?;
    String::from_utf8(xor_with_key(&decoded)).ok()
}
