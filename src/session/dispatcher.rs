use std::sync::Arc;

use tracing::{error, info, warn};

use super::mode::Mode;
use super::reveal::{RevealOutcome, RevealScheduler};
use crate::chat::{MessageStore, Slot};
use crate::config::{MessagesConfig, PromptConfig};
use crate::service::{extract_answer, AnswerService};

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Input was blank; nothing changed
    Skipped,
    /// The service answered and the answer was handed to the reveal
    Answered { text: String, reveal: RevealOutcome },
    /// The response carried no recognizable answer; the fallback was revealed
    Fallback { text: String, reveal: RevealOutcome },
    /// Transport or decode failure; the placeholder now shows the error text
    Failed { text: String },
}

impl DispatchOutcome {
    /// Text the assistant ended up answering with
    pub fn text(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Skipped => None,
            DispatchOutcome::Answered { text, .. }
            | DispatchOutcome::Fallback { text, .. }
            | DispatchOutcome::Failed { text } => Some(text),
        }
    }
}

/// Turns user text into one answer-service query and renders the reply.
///
/// Overlapping calls are not serialized here; callers that need at most one
/// query in flight have to enforce it themselves.
#[derive(Clone)]
pub struct QueryDispatcher {
    prompt: Arc<PromptConfig>,
    messages: Arc<MessagesConfig>,
    placeholder: String,
    answers: Arc<dyn AnswerService>,
    store: MessageStore,
    reveal: RevealScheduler,
}

impl QueryDispatcher {
    pub fn new(
        prompt: PromptConfig,
        messages: MessagesConfig,
        placeholder: impl Into<String>,
        answers: Arc<dyn AnswerService>,
        store: MessageStore,
        reveal: RevealScheduler,
    ) -> Self {
        Self {
            prompt: Arc::new(prompt),
            messages: Arc::new(messages),
            placeholder: placeholder.into(),
            answers,
            store,
            reveal,
        }
    }

    /// Compose the outbound query for `text` in `mode`.
    pub fn compose_prompt(&self, text: &str, mode: Mode) -> String {
        format!(
            "[AI Mode: {mode}]\n{instruction}\n\n{text}\n\n{note}\n\nApplication Summary:\n{summary}\n\n{closing}",
            mode = mode,
            instruction = self.prompt.instruction(mode),
            text = text,
            note = self.prompt.context_note,
            summary = self.prompt.summary,
            closing = self.prompt.closing,
        )
    }

    /// Send `raw_text` as a user message and answer it.
    ///
    /// Appends the user message and a typing placeholder, queries the answer
    /// service, then either reveals the answer into the placeholder or
    /// replaces it with the error text. If the timeline is cleared meanwhile
    /// the reply is dropped.
    pub async fn dispatch(&self, raw_text: &str, mode: Mode) -> DispatchOutcome {
        let text = raw_text.trim();
        if text.is_empty() {
            return DispatchOutcome::Skipped;
        }

        info!("Dispatching query in {} mode ({} bytes)", mode, text.len());

        self.store.append_user(text);
        let slot = self.store.push_placeholder(&self.placeholder);
        let pending = PendingReply::new(&self.store, slot, &self.messages.error);

        let prompt = self.compose_prompt(text, mode);

        match self.answers.ask(&prompt).await {
            Ok(body) => {
                let slot = pending.hand_off();
                match extract_answer(&body) {
                    Some(answer) => {
                        let reveal = self.reveal.start(slot, answer.clone()).await;
                        info!("Answer revealed ({:?})", reveal);
                        DispatchOutcome::Answered { text: answer, reveal }
                    }
                    None => {
                        warn!("Answer service response had no answer field");
                        let fallback = self.messages.fallback.clone();
                        let reveal = self.reveal.start(slot, fallback.clone()).await;
                        DispatchOutcome::Fallback { text: fallback, reveal }
                    }
                }
            }
            Err(e) => {
                error!("Answer service error: {}", e);
                pending.fail();
                DispatchOutcome::Failed {
                    text: self.messages.error.clone(),
                }
            }
        }
    }
}

/// Owns the typing placeholder until it is handed to the reveal or replaced
/// with the error text. Dropped while still pending (the dispatch future was
/// cancelled), it replaces the placeholder with the error text.
struct PendingReply<'a> {
    store: &'a MessageStore,
    slot: Slot,
    error_text: &'a str,
    armed: bool,
}

impl<'a> PendingReply<'a> {
    fn new(store: &'a MessageStore, slot: Slot, error_text: &'a str) -> Self {
        Self {
            store,
            slot,
            error_text,
            armed: true,
        }
    }

    fn hand_off(mut self) -> Slot {
        self.armed = false;
        self.slot
    }

    fn fail(mut self) {
        self.armed = false;
        self.store.settle(self.slot, self.error_text);
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Dispatch abandoned while awaiting an answer");
            self.store.settle(self.slot, self.error_text);
        }
    }
}
