/// Application name
pub const APP_NAME: &str = "Confab";

/// Static key for the XOR obfuscation codec.
///
/// Deliberately embedded in the binary: the codec is a demo-grade
/// reversible transform, not encryption. See [`crate::cipher`].
pub const OBFUSCATION_KEY: &str = "CONFAB_STATIC_KEY_V1";

/// Sentinel returned by [`crate::cipher::reveal`] when the input is not
/// valid obfuscated text.
pub const REVEAL_FAILED: &str = "Decryption failed.";

/// How many trailing messages of history feed a suggestion prompt.
pub const SUGGEST_HISTORY_WINDOW: usize = 5;

/// How many trailing messages of history feed a roleplay-reply prompt.
pub const ROLEPLAY_HISTORY_WINDOW: usize = 6;

/// Canned line appended when the reply oracle is unreachable.
pub const REPLY_FALLBACK: &str = "Sorry, I'm having trouble connecting right now.";

/// Canned line shown when a suggestion could not be generated.
pub const SUGGESTION_FALLBACK: &str = "Sorry, I couldn't generate a suggestion.";

/// Body text of the call-summary message appended on hangup.
pub const CALL_ENDED_BODY: &str = "Call ended";

/// Simulated latency applied to every mock-store operation, in milliseconds.
pub const DEFAULT_STORE_LATENCY_MS: u64 = 400;

/// Delay before a sent text message is marked as read, in milliseconds.
pub const DEFAULT_READ_RECEIPT_DELAY_MS: u64 = 2_000;

/// Delay before a delivered file message is marked as read, in milliseconds.
pub const DEFAULT_FILE_READ_RECEIPT_DELAY_MS: u64 = 1_000;

/// Simulated duration of a file upload, in milliseconds.
pub const DEFAULT_UPLOAD_DELAY_MS: u64 = 2_500;

/// Delay between dialing and the simulated callee picking up, in milliseconds.
pub const DEFAULT_CALL_CONNECT_DELAY_MS: u64 = 3_000;

/// Interval between presence-simulator ticks, in seconds.
pub const DEFAULT_PRESENCE_TICK_SECS: u64 = 5;

/// Probability that a contact flips online/offline on a presence tick.
pub const DEFAULT_PRESENCE_FLIP_PROBABILITY: f64 = 0.3;
