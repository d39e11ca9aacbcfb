//! Call lifecycle state machine: `idle → ringing → connected → idle`.
//!
//! At most one call exists process-wide. The machine itself is pure
//! state; the session controller owns the side effects (the simulated
//! connect timer and the call-summary message appended on hangup).
//!
//! Every `begin` hands out a generation number, and `connect` only fires
//! when the generation still matches, so an auto-connect timer that
//! outlives its call (user hung up while it was still ringing) lands on
//! nothing.

use chrono::{DateTime, Utc};

use confab_store::Contact;

use crate::error::{Result, SessionError};

/// Where the active call (if any) currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    Ringing,
    Connected { connected_at: DateTime<Utc> },
}

/// Terminal record handed back by [`CallState::hang_up`].
#[derive(Debug, Clone)]
pub struct CallSummary {
    /// The contact the call targeted, regardless of which conversation
    /// is open by the time the user hangs up.
    pub contact: Contact,
    /// Whole seconds from connect to hangup; `None` when the call never
    /// left ringing.
    pub duration_secs: Option<u64>,
}

/// The single process-wide call slot.
#[derive(Debug)]
pub struct CallState {
    phase: CallPhase,
    target: Option<Contact>,
    generation: u64,
}

impl CallState {
    pub fn new() -> Self {
        Self {
            phase: CallPhase::Idle,
            target: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> &CallPhase {
        &self.phase
    }

    pub fn target(&self) -> Option<&Contact> {
        self.target.as_ref()
    }

    /// Start ringing `target`. Rejected unless idle.
    ///
    /// Returns the generation the caller must present to [`connect`]
    /// later.
    ///
    /// [`connect`]: CallState::connect
    pub fn begin(&mut self, target: Contact) -> Result<u64> {
        if self.phase != CallPhase::Idle {
            return Err(SessionError::CallInProgress);
        }
        self.generation += 1;
        self.phase = CallPhase::Ringing;
        self.target = Some(target);
        Ok(self.generation)
    }

    /// Transition ringing → connected, recording the connect timestamp.
    ///
    /// Returns false (and changes nothing) when the generation no longer
    /// matches (the call was already hung up or replaced) or when it is
    /// not ringing.
    pub fn connect(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.phase != CallPhase::Ringing {
            return false;
        }
        self.phase = CallPhase::Connected {
            connected_at: Utc::now(),
        };
        true
    }

    /// End the call and return to idle.
    ///
    /// `None` when no call was active. Duration is `None` when the call
    /// never connected.
    pub fn hang_up(&mut self) -> Option<CallSummary> {
        let contact = self.target.take()?;
        let duration_secs = match &self.phase {
            CallPhase::Idle => None,
            CallPhase::Ringing => None,
            CallPhase::Connected { connected_at } => {
                Some((Utc::now() - *connected_at).num_seconds().max(0) as u64)
            }
        };
        self.phase = CallPhase::Idle;
        self.generation += 1;
        Some(CallSummary {
            contact,
            duration_secs,
        })
    }
}

impl Default for CallState {
    fn default() -> Self {
        Self::new()
    }
}
