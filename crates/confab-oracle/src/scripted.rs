//! Deterministic [`ReplyOracle`] for tests and offline demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use confab_store::Message;

use crate::error::{OracleError, Result};
use crate::ReplyOracle;

/// Replies from a queue, falling back to a fixed line when the queue is
/// empty. Can be switched into a failing mode to exercise fallback paths.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    suggestions: Mutex<VecDeque<String>>,
    failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            suggestions: Mutex::new(VecDeque::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Make every call take `delay` before answering, to exercise the
    /// in-flight-request paths.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("scripted oracle lock") = delay;
    }

    async fn simulate_delay(&self) {
        let delay = *self.delay.lock().expect("scripted oracle lock");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Queue the next roleplay reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .expect("scripted oracle lock")
            .push_back(reply.into());
    }

    /// Queue the next suggestion.
    pub fn push_suggestion(&self, suggestion: impl Into<String>) {
        self.suggestions
            .lock()
            .expect("scripted oracle lock")
            .push_back(suggestion.into());
    }

    /// Make every subsequent call fail with [`OracleError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(OracleError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyOracle for ScriptedOracle {
    async fn suggest(&self, _history: &[Message], draft: &str) -> Result<String> {
        self.simulate_delay().await;
        self.check_up()?;
        let queued = self
            .suggestions
            .lock()
            .expect("scripted oracle lock")
            .pop_front();
        Ok(queued.unwrap_or_else(|| format!("{draft}, sounds good to me!")))
    }

    async fn roleplay_reply(&self, _history: &[Message], contact_name: &str) -> Result<String> {
        self.simulate_delay().await;
        self.check_up()?;
        let queued = self
            .replies
            .lock()
            .expect("scripted oracle lock")
            .pop_front();
        Ok(queued.unwrap_or_else(|| format!("{contact_name} here, tell me more!")))
    }
}
