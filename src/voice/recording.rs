use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::UtteranceSink;
use crate::audio::{AudioFrame, CaptureBackend, MicrophoneAccess, RecordingBuffer};
use crate::chat::MessageStore;
use crate::config::{MessagesConfig, TranscriptionConfig};
use crate::service::{extract_transcript, TranscriptionService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Idle,
    /// Waiting on microphone permission
    Acquiring,
    /// Capturing; stays here after a stop request until capture actually ends
    Recording,
    Transcribing,
}

/// What a call to [`Recorder::toggle`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordToggle {
    Started { session_id: Uuid },
    StopRequested { session_id: Uuid },
    /// Microphone denied or failed to start; a notice was posted
    MicrophoneUnavailable(String),
    /// A previous toggle is still being carried out
    Busy(RecordState),
}

/// How one recording was processed once capture stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingOutcome {
    /// Transcribed and submitted as a user query
    Transcribed(String),
    /// The service answered without usable text
    EmptyTranscript,
    /// The service failed; server transcription is now disabled
    ServerFailed,
    /// Server transcription is disabled; the audio was discarded
    CapturedOnly,
    /// The captured audio could not be assembled
    AssemblyFailed,
}

/// Fixed inputs for a [`Recorder`]
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub transcription: TranscriptionConfig,
    pub messages: MessagesConfig,
}

/// Record-and-transcribe state machine:
/// `Idle -> Recording -> (Transcribing) -> Idle`.
///
/// Holds at most one microphone stream at a time. A transcription failure
/// switches server transcription off for the rest of the session.
#[derive(Clone)]
pub struct Recorder {
    microphone: Arc<dyn MicrophoneAccess>,
    transcriber: Arc<dyn TranscriptionService>,
    sink: Arc<dyn UtteranceSink>,
    store: MessageStore,
    settings: Arc<RecorderSettings>,
    server_transcription: Arc<AtomicBool>,
    shared: Arc<Mutex<RecorderShared>>,
}

struct RecorderShared {
    state: RecordState,
    session: Option<ActiveRecording>,
    processing: Option<JoinHandle<RecordingOutcome>>,
}

/// The device is held here until capture reports it has ended
struct ActiveRecording {
    id: Uuid,
    backend: Box<dyn CaptureBackend>,
    stop_requested: bool,
}

impl Recorder {
    pub fn new(
        microphone: Arc<dyn MicrophoneAccess>,
        transcriber: Arc<dyn TranscriptionService>,
        sink: Arc<dyn UtteranceSink>,
        store: MessageStore,
        settings: RecorderSettings,
    ) -> Self {
        let server_transcription = Arc::new(AtomicBool::new(settings.transcription.enabled));
        Self {
            microphone,
            transcriber,
            sink,
            store,
            settings: Arc::new(settings),
            server_transcription,
            shared: Arc::new(Mutex::new(RecorderShared {
                state: RecordState::Idle,
                session: None,
                processing: None,
            })),
        }
    }

    fn shared(&self) -> MutexGuard<'_, RecorderShared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RecordState {
        self.shared().state
    }

    pub fn server_transcription_enabled(&self) -> bool {
        self.server_transcription.load(Ordering::SeqCst)
    }

    /// Start recording when idle, request a stop when recording.
    ///
    /// Starting suspends on microphone acquisition. Stopping returns at once;
    /// the move back to `Idle` happens when capture reports it has ended.
    pub async fn toggle(&self) -> RecordToggle {
        {
            let mut shared = self.shared();
            match shared.state {
                RecordState::Idle => shared.state = RecordState::Acquiring,
                RecordState::Recording => {
                    let Some(session) = shared.session.as_mut() else {
                        return RecordToggle::Busy(RecordState::Recording);
                    };
                    if session.stop_requested {
                        return RecordToggle::Busy(RecordState::Recording);
                    }
                    session.backend.stop();
                    session.stop_requested = true;
                    info!("Stop requested for recording {}", session.id);
                    return RecordToggle::StopRequested {
                        session_id: session.id,
                    };
                }
                state => return RecordToggle::Busy(state),
            }
        }

        info!("Requesting microphone access");
        let started = match self.microphone.acquire().await {
            Ok(mut backend) => match backend.start() {
                Ok(frames) => Ok((backend, frames)),
                Err(e) => Err(e.context(format!("Failed to start {} capture", backend.name()))),
            },
            Err(e) => Err(e),
        };

        match started {
            Ok((backend, frames)) => {
                let session_id = Uuid::new_v4();
                info!("Recording {} started on {}", session_id, backend.name());

                let mut shared = self.shared();
                shared.state = RecordState::Recording;
                shared.session = Some(ActiveRecording {
                    id: session_id,
                    backend,
                    stop_requested: false,
                });
                shared.processing = Some(tokio::spawn(self.clone().collect(session_id, frames)));

                RecordToggle::Started { session_id }
            }
            Err(e) => {
                error!("Microphone error: {:#}", e);
                self.shared().state = RecordState::Idle;
                let notice = self.settings.messages.microphone_unavailable.clone();
                self.store.append_assistant(notice.clone());
                RecordToggle::MicrophoneUnavailable(notice)
            }
        }
    }

    /// Wait for the most recent recording to finish processing.
    pub async fn wait_processed(&self) -> Option<RecordingOutcome> {
        let handle = self.shared().processing.take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Recording task failed: {}", e);
                None
            }
        }
    }

    async fn collect(self, session_id: Uuid, mut frames: mpsc::Receiver<AudioFrame>) -> RecordingOutcome {
        let mut buffer = RecordingBuffer::new();
        while let Some(frame) = frames.recv().await {
            buffer.push(frame);
        }

        info!(
            "Recording {} captured: {} frames, {} samples",
            session_id,
            buffer.frame_count(),
            buffer.sample_count()
        );

        // Capture has ended; release the device
        if let Some(mut session) = self.shared().session.take() {
            if session.backend.is_capturing() {
                session.backend.stop();
            }
        }

        let outcome = self.process(buffer).await;
        info!("Recording {} processed: {:?}", session_id, outcome);
        outcome
    }

    async fn process(&self, buffer: RecordingBuffer) -> RecordingOutcome {
        let messages = &self.settings.messages;
        let transcription = &self.settings.transcription;

        let blob = match buffer.into_blob(&transcription.file_name, &transcription.mime_type) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to assemble recording: {:#}", e);
                self.set_state(RecordState::Idle);
                self.store.append_assistant(messages.transcription_empty.clone());
                return RecordingOutcome::AssemblyFailed;
            }
        };

        if !self.server_transcription_enabled() {
            self.set_state(RecordState::Idle);
            self.store.append_assistant(messages.voice_recorded.clone());
            return RecordingOutcome::CapturedOnly;
        }

        self.set_state(RecordState::Transcribing);
        self.store.append_assistant(messages.processing_voice.clone());

        match self.transcriber.transcribe(blob).await {
            Ok(body) => {
                let text = extract_transcript(&body);
                self.set_state(RecordState::Idle);
                if text.is_empty() {
                    warn!("Transcription returned no text");
                    self.store.append_assistant(messages.transcription_empty.clone());
                    RecordingOutcome::EmptyTranscript
                } else {
                    self.sink.submit(text.clone()).await;
                    RecordingOutcome::Transcribed(text)
                }
            }
            Err(e) => {
                warn!("Server transcription failed, disabling for this session: {}", e);
                self.server_transcription.store(false, Ordering::SeqCst);
                self.set_state(RecordState::Idle);
                self.store.append_assistant(messages.transcription_unavailable.clone());
                RecordingOutcome::ServerFailed
            }
        }
    }

    fn set_state(&self, state: RecordState) {
        self.shared().state = state;
    }
}
