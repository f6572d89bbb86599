use chrono::{DateTime, Utc};
use serde::Serialize;

use super::mode::Mode;
use crate::voice::{ListenState, RecordState};

/// Snapshot of an assistant session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Mode the next dispatch will use
    pub mode: Mode,

    /// Whether a query is awaiting its answer or reveal
    pub dispatch_in_flight: bool,

    /// Whether an answer is currently being revealed
    pub revealing: bool,

    pub listening: ListenState,

    /// Whether this platform has live speech recognition
    pub recognition_supported: bool,

    pub recording: RecordState,

    /// Cleared permanently after the first transcription failure
    pub server_transcription: bool,

    pub timeline_len: usize,

    pub history_len: usize,
}
