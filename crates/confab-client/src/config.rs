//! Client configuration loaded from environment variables.
//!
//! All settings default to the constants in `confab_shared::constants`,
//! so the demo starts with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use confab_shared::constants::{
    DEFAULT_CALL_CONNECT_DELAY_MS, DEFAULT_FILE_READ_RECEIPT_DELAY_MS,
    DEFAULT_PRESENCE_FLIP_PROBABILITY, DEFAULT_PRESENCE_TICK_SECS, DEFAULT_READ_RECEIPT_DELAY_MS,
    DEFAULT_STORE_LATENCY_MS, DEFAULT_UPLOAD_DELAY_MS,
};

/// Delays driving the session controller's simulated continuations.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Delay before a sent text message is marked read.
    pub read_receipt: Duration,
    /// Delay before a delivered file message is marked read.
    pub file_read_receipt: Duration,
    /// Simulated duration of a file upload.
    pub upload: Duration,
    /// Delay between dialing and the callee picking up.
    pub call_connect: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            read_receipt: Duration::from_millis(DEFAULT_READ_RECEIPT_DELAY_MS),
            file_read_receipt: Duration::from_millis(DEFAULT_FILE_READ_RECEIPT_DELAY_MS),
            upload: Duration::from_millis(DEFAULT_UPLOAD_DELAY_MS),
            call_connect: Duration::from_millis(DEFAULT_CALL_CONNECT_DELAY_MS),
        }
    }
}

impl Timing {
    /// All delays zero. Tests use this so nothing waits on wall time.
    pub fn instant() -> Self {
        Self {
            read_receipt: Duration::ZERO,
            file_read_receipt: Duration::ZERO,
            upload: Duration::ZERO,
            call_connect: Duration::ZERO,
        }
    }
}

/// Demo binary configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Artificial latency on every store call.
    /// Env: `CONFAB_STORE_LATENCY_MS`
    pub store_latency: Duration,

    /// Continuation delays (read receipts, uploads, call connect).
    /// Env: `CONFAB_READ_RECEIPT_MS`, `CONFAB_FILE_READ_RECEIPT_MS`,
    /// `CONFAB_UPLOAD_MS`, `CONFAB_CALL_CONNECT_MS`
    pub timing: Timing,

    /// Presence simulator tick interval.
    /// Env: `CONFAB_PRESENCE_TICK_SECS`
    pub presence_tick: Duration,

    /// Probability of a presence flip per contact per tick.
    /// Env: `CONFAB_PRESENCE_FLIP_PROBABILITY`
    pub presence_flip_probability: f64,

    /// Override for the JSON store directory.
    /// Env: `CONFAB_DATA_DIR`
    /// Default: platform data dir.
    pub data_dir: Option<PathBuf>,

    /// Completion endpoint for the HTTP oracle. When unset, the demo
    /// runs with the scripted oracle instead.
    /// Env: `CONFAB_ORACLE_URL`
    pub oracle_url: Option<String>,

    /// Bearer key for the completion endpoint.
    /// Env: `CONFAB_ORACLE_KEY`
    pub oracle_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_latency: Duration::from_millis(DEFAULT_STORE_LATENCY_MS),
            timing: Timing::default(),
            presence_tick: Duration::from_secs(DEFAULT_PRESENCE_TICK_SECS),
            presence_flip_probability: DEFAULT_PRESENCE_FLIP_PROBABILITY,
            data_dir: None,
            oracle_url: None,
            oracle_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_u64("CONFAB_STORE_LATENCY_MS") {
            config.store_latency = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("CONFAB_READ_RECEIPT_MS") {
            config.timing.read_receipt = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("CONFAB_FILE_READ_RECEIPT_MS") {
            config.timing.file_read_receipt = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("CONFAB_UPLOAD_MS") {
            config.timing.upload = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("CONFAB_CALL_CONNECT_MS") {
            config.timing.call_connect = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("CONFAB_PRESENCE_TICK_SECS") {
            config.presence_tick = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("CONFAB_PRESENCE_FLIP_PROBABILITY") {
            match val.parse::<f64>() {
                Ok(p) if (0.0..=1.0).contains(&p) => config.presence_flip_probability = p,
                _ => {
                    tracing::warn!(value = %val, "Invalid CONFAB_PRESENCE_FLIP_PROBABILITY, using default");
                }
            }
        }

        if let Ok(dir) = std::env::var("CONFAB_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(url) = std::env::var("CONFAB_ORACLE_URL") {
            if !url.is_empty() {
                config.oracle_url = Some(url);
            }
        }
        if let Ok(key) = std::env::var("CONFAB_ORACLE_KEY") {
            if !key.is_empty() {
                config.oracle_api_key = Some(key);
            }
        }

        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    match val.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var = name, value = %val, "Invalid integer, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_latency, Duration::from_millis(400));
        assert_eq!(config.timing.read_receipt, Duration::from_millis(2_000));
        assert_eq!(config.presence_flip_probability, 0.3);
        assert!(config.oracle_url.is_none());
    }

    #[test]
    fn test_instant_timing_is_all_zero() {
        let timing = Timing::instant();
        assert!(timing.read_receipt.is_zero());
        assert!(timing.upload.is_zero());
        assert!(timing.call_connect.is_zero());
    }
}
