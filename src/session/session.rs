use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::dispatcher::{DispatchOutcome, QueryDispatcher};
use super::mode::{Mode, ModeController};
use super::reveal::RevealScheduler;
use super::stats::SessionStats;
use crate::audio::{CueEmitter, CueKind, MicrophoneAccess, SilentOutput, ToneOutput, UnavailableMicrophone};
use crate::chat::{Message, MessageStore};
use crate::config::Config;
use crate::service::{AnswerService, TranscriptionService};
use crate::voice::{
    ListenToggle, LiveRecognition, RecordToggle, Recorder, RecorderSettings, RecordingOutcome,
    SpeechRecognizer, UtteranceSink,
};

/// Remote services the session talks to
#[derive(Clone)]
pub struct Services {
    pub answers: Arc<dyn AnswerService>,
    pub transcriber: Arc<dyn TranscriptionService>,
}

/// Platform capabilities available to the session
#[derive(Clone)]
pub struct Platform {
    /// `None` when the platform has no speech recognition
    pub recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pub microphone: Arc<dyn MicrophoneAccess>,
    pub tone_output: Arc<dyn ToneOutput>,
}

impl Platform {
    /// No recognizer, no microphone, silent cues
    pub fn headless() -> Self {
        Self {
            recognizer: None,
            microphone: Arc::new(UnavailableMicrophone),
            tone_output: Arc::new(SilentOutput),
        }
    }
}

/// Result of a send from the presentation surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Dispatched(DispatchOutcome),
    /// Another query is still in flight; nothing changed
    Busy,
    UnknownPreset(usize),
}

/// One conversation: message store, mode, dispatcher and both voice inputs,
/// behind the operations the presentation surface invokes.
///
/// Sends are limited to one query in flight at a time. Clones share the same
/// session.
#[derive(Clone)]
pub struct AssistantSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    started_at: DateTime<Utc>,
    presets: Vec<String>,
    voice_busy: String,
    store: MessageStore,
    modes: ModeController,
    reveal: RevealScheduler,
    dispatcher: QueryDispatcher,
    cues: CueEmitter,
    in_flight: AtomicBool,
    recognition: LiveRecognition,
    recorder: Recorder,
}

/// Feeds recognized voice text back into the owning session
struct SessionSink(Weak<SessionInner>);

#[async_trait::async_trait]
impl UtteranceSink for SessionSink {
    async fn submit(&self, text: String) {
        let Some(inner) = self.0.upgrade() else {
            warn!("Session dropped before voice input could be sent");
            return;
        };
        let session = AssistantSession { inner };
        if session.send(&text).await == SendOutcome::Busy {
            // Keep what was said visible, then tell the user it was not sent
            warn!("Voice input arrived while a query is in flight, not dispatched");
            let store = &session.inner.store;
            store.append_user(text.trim());
            store.append_assistant(session.inner.voice_busy.clone());
        }
    }
}

impl AssistantSession {
    pub fn new(config: &Config, services: Services, platform: Platform) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<SessionInner>| {
            let sink: Arc<dyn UtteranceSink> = Arc::new(SessionSink(weak.clone()));

            let cues = CueEmitter::new(platform.tone_output);
            let store = MessageStore::new(
                &config.messages.greeting,
                config.messages.cleared.clone(),
                cues.clone(),
            );
            let reveal = RevealScheduler::new(store.clone(), Duration::from_millis(config.reveal.tick_ms));
            let dispatcher = QueryDispatcher::new(
                config.prompt.clone(),
                config.messages.clone(),
                config.reveal.placeholder.clone(),
                services.answers,
                store.clone(),
                reveal.clone(),
            );
            let recognition = LiveRecognition::new(
                platform.recognizer,
                Arc::clone(&sink),
                config.messages.recognition_unsupported.clone(),
            );
            let recorder = Recorder::new(
                platform.microphone,
                services.transcriber,
                sink,
                store.clone(),
                RecorderSettings {
                    transcription: config.transcription.clone(),
                    messages: config.messages.clone(),
                },
            );

            SessionInner {
                started_at: Utc::now(),
                presets: config.presets.clone(),
                voice_busy: config.messages.voice_busy.clone(),
                store,
                modes: ModeController::default(),
                reveal,
                dispatcher,
                cues,
                in_flight: AtomicBool::new(false),
                recognition,
                recorder,
            }
        });

        info!("Assistant session created");
        Self { inner }
    }

    /// Send user text as a query using the mode current at this moment.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Dispatched(DispatchOutcome::Skipped);
        }

        let Some(_slot) = InFlight::claim(&self.inner.in_flight) else {
            warn!("Send rejected, a query is already in flight");
            return SendOutcome::Busy;
        };

        let mode = self.inner.modes.current();
        SendOutcome::Dispatched(self.inner.dispatcher.dispatch(text, mode).await)
    }

    pub async fn send_preset(&self, index: usize) -> SendOutcome {
        match self.inner.presets.get(index) {
            Some(text) => self.send(text).await,
            None => SendOutcome::UnknownPreset(index),
        }
    }

    pub fn presets(&self) -> &[String] {
        &self.inner.presets
    }

    /// Widget opened
    pub fn open(&self) {
        self.inner.cues.emit(CueKind::Open);
    }

    pub fn mode(&self) -> Mode {
        self.inner.modes.current()
    }

    pub fn set_mode(&self, mode: Mode) {
        self.inner.modes.set(mode);
    }

    pub fn cycle_mode(&self) -> Mode {
        self.inner.modes.cycle()
    }

    pub fn clear(&self) {
        self.inner.store.clear();
    }

    pub fn toggle_listening(&self) -> ListenToggle {
        self.inner.recognition.toggle()
    }

    pub async fn toggle_recording(&self) -> RecordToggle {
        self.inner.recorder.toggle().await
    }

    /// Wait until the last stopped recording has been transcribed (and its
    /// query sent) or otherwise handled.
    pub async fn recording_processed(&self) -> Option<RecordingOutcome> {
        self.inner.recorder.wait_processed().await
    }

    pub fn timeline(&self) -> Vec<Message> {
        self.inner.store.timeline()
    }

    pub fn history(&self) -> Vec<Message> {
        self.inner.store.history()
    }

    pub fn store(&self) -> &MessageStore {
        &self.inner.store
    }

    pub fn stats(&self) -> SessionStats {
        let inner = &self.inner;
        SessionStats {
            started_at: inner.started_at,
            mode: inner.modes.current(),
            dispatch_in_flight: inner.in_flight.load(Ordering::SeqCst),
            revealing: inner.reveal.is_active(),
            listening: inner.recognition.state(),
            recognition_supported: inner.recognition.is_supported(),
            recording: inner.recorder.state(),
            server_transcription: inner.recorder.server_transcription_enabled(),
            timeline_len: inner.store.timeline_len(),
            history_len: inner.store.history_len(),
        }
    }
}

/// Single-slot in-flight marker, released on drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
