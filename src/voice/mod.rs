//! Voice input
//!
//! Two independent capture paths that both end by submitting recognized text
//! as a user query:
//! - `LiveRecognition` drives a platform speech recognizer (no audio kept)
//! - `Recorder` captures a full recording and sends it to the transcription
//!   service afterwards

mod recognition;
mod recording;

pub use recognition::{ListenState, ListenToggle, LiveRecognition, RecognitionEvent, SpeechRecognizer};
pub use recording::{RecordState, RecordToggle, Recorder, RecorderSettings, RecordingOutcome};

/// Destination for text recognized by either voice path.
#[async_trait::async_trait]
pub trait UtteranceSink: Send + Sync {
    async fn submit(&self, text: String);
}
