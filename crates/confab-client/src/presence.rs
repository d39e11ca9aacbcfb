//! Background presence simulator.
//!
//! On a fixed interval, every contact except the one currently open flips
//! online/offline with a fixed probability, stamping `last_seen` on the
//! way offline. The open contact is skipped so presence never changes
//! under the user mid-conversation. The tick reads and mutates only the
//! shared view; it never awaits the store or the oracle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::debug;

use confab_oracle::ReplyOracle;
use confab_shared::types::{ContactId, Presence};
use confab_store::{Contact, ConversationStore};

use crate::session::ChatSession;

/// One simulation step over a contact list.
///
/// Exposed separately from the spawned loop so it can be driven with a
/// seeded RNG.
pub fn flip_presence<R: Rng>(
    contacts: &mut [Contact],
    selected: Option<&ContactId>,
    probability: f64,
    rng: &mut R,
    now: DateTime<Utc>,
) {
    for contact in contacts.iter_mut() {
        if Some(&contact.id) == selected {
            continue;
        }
        if !rng.gen_bool(probability) {
            continue;
        }
        contact.presence = match contact.presence {
            Presence::Online => Presence::Offline { last_seen: now },
            Presence::Offline { .. } => Presence::Online,
        };
        debug!(contact = %contact.id, online = contact.presence.is_online(), "Presence flipped");
    }
}

/// Run the simulator against a session until the returned handle is
/// aborted.
pub fn spawn_presence_simulator<S, O>(
    session: &ChatSession<S, O>,
    tick: Duration,
    probability: f64,
) -> JoinHandle<()>
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    let session = session.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        // The first tick fires immediately; skip it so contacts keep
        // their seeded presence for one full interval.
        interval.tick().await;
        loop {
            interval.tick().await;
            let mut view = session.view.lock().await;
            let selected = view.selected.clone();
            flip_presence(
                &mut view.contacts,
                selected.as_ref(),
                probability,
                &mut rand::thread_rng(),
                Utc::now(),
            );
        }
    })
}
