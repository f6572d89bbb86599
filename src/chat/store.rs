use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::message::{Message, Origin};
use crate::audio::{CueEmitter, CueKind};

/// Conversation timeline plus the append-only audit history.
///
/// The timeline only ever grows, except that a provisional assistant entry
/// (see [`MessageStore::push_placeholder`]) can be rewritten in place while its
/// answer is pending or being revealed. History only ever receives finalized
/// messages and survives [`MessageStore::clear`].
#[derive(Clone)]
pub struct MessageStore {
    state: Arc<Mutex<StoreState>>,
    cues: CueEmitter,
}

struct StoreState {
    timeline: Vec<Message>,
    history: Vec<Message>,
    /// Bumped by every clear; slots from an older generation are dead
    generation: u64,
    /// Bumped whenever a new reveal claims a slot
    reveal_epoch: u64,
    cleared: String,
}

impl StoreState {
    fn lock(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
        state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn holds(&self, slot: Slot) -> bool {
        self.generation == slot.generation
    }
}

/// Position of one provisional assistant entry in the timeline.
///
/// Only valid until the next [`MessageStore::clear`]; writes through a stale
/// slot are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    generation: u64,
    index: usize,
}

impl MessageStore {
    /// Create a store whose timeline is seeded with `greeting`.
    ///
    /// An empty greeting falls back to the `cleared` line so the timeline is
    /// never empty.
    pub fn new(greeting: &[String], cleared: impl Into<String>, cues: CueEmitter) -> Self {
        let cleared = cleared.into();
        let mut timeline: Vec<Message> = greeting.iter().map(Message::assistant).collect();
        if timeline.is_empty() {
            timeline.push(Message::assistant(cleared.clone()));
        }

        Self {
            state: Arc::new(Mutex::new(StoreState {
                timeline,
                history: Vec::new(),
                generation: 0,
                reveal_epoch: 0,
                cleared,
            })),
            cues,
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        StoreState::lock(&self.state)
    }

    pub fn append_user(&self, text: impl Into<String>) {
        self.append(Message::user(text));
        self.cues.emit(CueKind::Send);
    }

    pub fn append_assistant(&self, text: impl Into<String>) {
        self.append(Message::assistant(text));
        self.cues.emit(CueKind::Recv);
    }

    fn append(&self, message: Message) {
        let mut state = self.state();
        state.history.push(message.clone());
        state.timeline.push(message);
    }

    /// Reset the timeline to the single cleared line. History is kept; every
    /// outstanding slot, pending or being revealed, goes dead.
    pub fn clear(&self) {
        let mut state = self.state();
        let cleared = Message::assistant(state.cleared.clone());
        state.timeline = vec![cleared];
        state.generation += 1;
        debug!("Timeline cleared ({} history entries kept)", state.history.len());
    }

    pub fn timeline(&self) -> Vec<Message> {
        self.state().timeline.clone()
    }

    pub fn history(&self) -> Vec<Message> {
        self.state().history.clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.state().timeline.last().cloned()
    }

    pub fn timeline_len(&self) -> usize {
        self.state().timeline.len()
    }

    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    /// Append the provisional assistant entry shown while an answer is pending.
    /// Timeline only, no cue.
    pub fn push_placeholder(&self, glyph: &str) -> Slot {
        let mut state = self.state();
        state.timeline.push(Message::assistant(glyph));
        Slot {
            generation: state.generation,
            index: state.timeline.len() - 1,
        }
    }

    /// Replace `slot` with a finalized assistant message and record it in
    /// history. Returns `false` (and changes nothing) if the timeline was
    /// cleared since the slot was created.
    pub(crate) fn settle(&self, slot: Slot, text: &str) -> bool {
        let mut state = self.state();
        if !state.holds(slot) {
            debug!("Dropping reply for a cleared slot");
            return false;
        }
        let message = Message::assistant(text);
        *slot_entry(&mut state, slot) = message.clone();
        state.history.push(message);
        true
    }

    /// Take exclusive write access to `slot`, detaching any writer handed out
    /// earlier.
    pub(crate) fn claim_reveal(&self, slot: Slot) -> RevealWriter {
        let mut state = self.state();
        state.reveal_epoch += 1;
        RevealWriter {
            state: Arc::clone(&self.state),
            epoch: state.reveal_epoch,
            slot,
        }
    }
}

fn slot_entry(state: &mut StoreState, slot: Slot) -> &mut Message {
    let len = state.timeline.len();
    state
        .timeline
        .get_mut(slot.index)
        .unwrap_or_else(|| panic!("slot {} past the end of a timeline of {}", slot.index, len))
}

/// Single-writer handle on one timeline slot, held by one reveal.
pub(crate) struct RevealWriter {
    state: Arc<Mutex<StoreState>>,
    epoch: u64,
    slot: Slot,
}

impl RevealWriter {
    fn is_current(&self, state: &StoreState) -> bool {
        state.reveal_epoch == self.epoch && state.holds(self.slot)
    }

    /// Overwrite the content of the claimed slot.
    ///
    /// Returns `false` once this writer has been superseded or the timeline
    /// was cleared, in which case nothing is written.
    ///
    /// # Panics
    ///
    /// Panics if the slot lies past the end of the timeline.
    pub(crate) fn write(&self, prefix: &str) -> bool {
        let mut state = StoreState::lock(&self.state);
        if !self.is_current(&state) {
            return false;
        }

        let entry = slot_entry(&mut state, self.slot);
        if entry.origin != Origin::Assistant {
            warn!("Reveal slot {} is not an assistant message; reveal detached", self.slot.index);
            return false;
        }

        entry.content.clear();
        entry.content.push_str(prefix);
        true
    }

    /// Record the fully revealed answer in history.
    pub(crate) fn commit(self, full_text: &str) -> bool {
        let mut state = StoreState::lock(&self.state);
        if !self.is_current(&state) {
            return false;
        }
        state.history.push(Message::assistant(full_text));
        true
    }
}
