use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::chat::{MessageStore, RevealWriter, Slot};

/// How a reveal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The full text was written into the slot
    Completed,
    /// A later reveal took over, or the timeline was cleared, first
    Superseded,
}

/// Writes a resolved answer into a placeholder slot one character per tick.
///
/// At most one reveal ticks at a time: starting a new one aborts the previous
/// task and revokes its write access to the timeline, so a superseded reveal
/// can never write again even if it was mid-tick.
#[derive(Clone)]
pub struct RevealScheduler {
    store: MessageStore,
    tick: Duration,
    active: Arc<Mutex<Option<AbortHandle>>>,
}

impl RevealScheduler {
    pub fn new(store: MessageStore, tick: Duration) -> Self {
        Self {
            store,
            tick,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Reveal `full_text` into `slot`, resolving once it has been written in
    /// full or the reveal has been superseded.
    pub async fn start(&self, slot: Slot, full_text: String) -> RevealOutcome {
        let task = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            let writer = self.store.claim_reveal(slot);
            let task = tokio::spawn(run_reveal(writer, full_text, self.tick));
            if let Some(previous) = active.replace(task.abort_handle()) {
                if !previous.is_finished() {
                    debug!("Superseding running reveal");
                }
                previous.abort();
            }
            task
        };

        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => RevealOutcome::Superseded,
            Err(e) => {
                warn!("Reveal task failed: {}", e);
                RevealOutcome::Superseded
            }
        }
    }

    /// Whether a reveal is currently ticking
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

async fn run_reveal(writer: RevealWriter, full_text: String, tick: Duration) -> RevealOutcome {
    // Byte offset after each character, so every prefix is a valid str slice
    let ends: Vec<usize> = full_text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect();

    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cursor = 0;
    loop {
        ticker.tick().await;
        cursor += 1;

        let end = ends.get(cursor - 1).copied().unwrap_or(full_text.len());
        if !writer.write(&full_text[..end]) {
            return RevealOutcome::Superseded;
        }

        if cursor >= ends.len() {
            break;
        }
    }

    if writer.commit(&full_text) {
        RevealOutcome::Completed
    } else {
        RevealOutcome::Superseded
    }
}
