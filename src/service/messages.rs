use serde_json::Value;

/// Response fields that may carry an answer, in priority order
pub const ANSWER_FIELDS: [&str; 2] = ["BK9", "answer"];

/// Response fields that may carry a transcript, in priority order
pub const TRANSCRIPT_FIELDS: [&str; 2] = ["text", "transcript"];

/// Pull the answer out of an answer-service response.
///
/// The first field present as a string wins, even when it is empty. `None`
/// means the response had no recognizable answer.
pub fn extract_answer(body: &Value) -> Option<String> {
    ANSWER_FIELDS
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Pull the transcript out of a transcription-service response.
///
/// Empty fields are skipped; no usable field yields an empty string.
pub fn extract_transcript(body: &Value) -> String {
    TRANSCRIPT_FIELDS
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}
