pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod session;
pub mod voice;

pub use audio::{AudioBlob, AudioFrame, CaptureBackend, CueEmitter, CueKind, MicrophoneAccess, WavFileMicrophone};
pub use chat::{Message, MessageStore, Origin, Slot};
pub use config::Config;
pub use error::ServiceError;
pub use http::{create_router, AppState};
pub use service::{AnswerService, HttpAnswerClient, HttpTranscriptionClient, TranscriptionService};
pub use session::{
    AssistantSession, DispatchOutcome, Mode, ModeController, Platform, QueryDispatcher, RevealOutcome,
    RevealScheduler, SendOutcome, Services, SessionStats,
};
pub use voice::{LiveRecognition, Recorder, SpeechRecognizer, UtteranceSink};
