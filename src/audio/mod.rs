pub mod backend;
pub mod blob;
pub mod cue;
pub mod file;

pub use backend::{AudioFrame, CaptureBackend, CaptureConfig, MicrophoneAccess, UnavailableMicrophone};
pub use blob::{AudioBlob, RecordingBuffer};
pub use cue::{CueEmitter, CueKind, SilentOutput, Tone, ToneOutput, ToneVoice};
pub use file::{AudioFile, WavFileMicrophone};
