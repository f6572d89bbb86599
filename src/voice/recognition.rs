use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::UtteranceSink;

/// Event delivered by a platform recognizer during one session
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Final result, best alternative first
    Result { alternatives: Vec<String> },
    Error(String),
    /// The platform ended the session
    End,
}

/// Platform speech-to-text capability.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin a recognition session. The channel closes when the session ends.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>>;

    /// Ask the platform to end the current session
    fn stop(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenState {
    Idle,
    Listening,
}

/// What a call to [`LiveRecognition::toggle`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenToggle {
    Started,
    Stopped,
    /// No recognizer on this platform; carries the notice to show
    Unsupported(String),
    /// The recognizer refused to start
    Failed(String),
}

/// Live recognition state machine: `Idle -> Listening -> Idle`.
#[derive(Clone)]
pub struct LiveRecognition {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    sink: Arc<dyn UtteranceSink>,
    unsupported_notice: String,
    shared: Arc<Mutex<ListenShared>>,
}

struct ListenShared {
    state: ListenState,
    /// Identifies the current platform session so a stale end event cannot
    /// reset a newer one
    session: u64,
}

impl LiveRecognition {
    pub fn new(
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        sink: Arc<dyn UtteranceSink>,
        unsupported_notice: impl Into<String>,
    ) -> Self {
        Self {
            recognizer,
            sink,
            unsupported_notice: unsupported_notice.into(),
            shared: Arc::new(Mutex::new(ListenShared {
                state: ListenState::Idle,
                session: 0,
            })),
        }
    }

    fn shared(&self) -> MutexGuard<'_, ListenShared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> ListenState {
        self.shared().state
    }

    /// Start listening when idle, stop when listening.
    ///
    /// Stopping moves to `Idle` right away without waiting for the platform
    /// to confirm.
    pub fn toggle(&self) -> ListenToggle {
        let Some(recognizer) = &self.recognizer else {
            warn!("Speech recognition requested but not supported");
            return ListenToggle::Unsupported(self.unsupported_notice.clone());
        };

        let mut shared = self.shared();
        match shared.state {
            ListenState::Listening => {
                recognizer.stop();
                shared.state = ListenState::Idle;
                info!("Live recognition stopped");
                ListenToggle::Stopped
            }
            ListenState::Idle => {
                shared.session += 1;
                let session = shared.session;

                match recognizer.start() {
                    Ok(events) => {
                        shared.state = ListenState::Listening;
                        info!("Live recognition started (session {})", session);
                        tokio::spawn(self.clone().pump(events, session));
                        ListenToggle::Started
                    }
                    Err(e) => {
                        warn!("Speech recognizer failed to start: {}", e);
                        ListenToggle::Failed(e.to_string())
                    }
                }
            }
        }
    }

    async fn pump(self, mut events: mpsc::UnboundedReceiver<RecognitionEvent>, session: u64) {
        while let Some(event) = events.recv().await {
            match event {
                RecognitionEvent::Result { alternatives } => {
                    let Some(top) = alternatives.into_iter().next() else {
                        continue;
                    };
                    debug!("Recognized utterance ({} chars)", top.chars().count());
                    let sink = Arc::clone(&self.sink);
                    tokio::spawn(async move { sink.submit(top).await });
                }
                RecognitionEvent::Error(e) => {
                    warn!("Speech recognition error: {}", e);
                    self.settle_idle(session);
                }
                RecognitionEvent::End => {
                    self.settle_idle(session);
                }
            }
        }
        self.settle_idle(session);
    }

    fn settle_idle(&self, session: u64) {
        let mut shared = self.shared();
        if shared.session == session && shared.state != ListenState::Idle {
            shared.state = ListenState::Idle;
            info!("Live recognition session {} ended", session);
        }
    }
}
