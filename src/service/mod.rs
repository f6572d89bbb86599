pub mod client;
pub mod messages;

pub use client::{AnswerService, HttpAnswerClient, HttpTranscriptionClient, TranscriptionService};
pub use messages::{extract_answer, extract_transcript};
