use super::state::AppState;
use crate::chat::Message;
use crate::session::{Mode, SendOutcome};
use crate::voice::{ListenToggle, RecordToggle};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: Mode,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ModeResponse {
    pub mode: Mode,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn accepted(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted".to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /chat/timeline
pub async fn get_timeline(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.session.timeline())
}

/// GET /chat/history
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.session.history())
}

/// GET /chat/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.stats()))
}

/// POST /chat/send
/// Dispatch typed text; the answer is revealed into the timeline afterwards
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "Message text is empty");
    }
    if state.session.stats().dispatch_in_flight {
        return error(StatusCode::CONFLICT, "A query is already in flight");
    }

    let session = state.session.clone();
    tokio::spawn(async move {
        if session.send(&req.text).await == SendOutcome::Busy {
            warn!("Send lost the in-flight race");
        }
    });

    accepted("Query dispatched")
}

/// GET /chat/presets
pub async fn list_presets(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.session.presets().to_vec())
}

/// POST /chat/presets/:index
pub async fn send_preset(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    if index >= state.session.presets().len() {
        return error(StatusCode::NOT_FOUND, format!("Preset {} not found", index));
    }
    if state.session.stats().dispatch_in_flight {
        return error(StatusCode::CONFLICT, "A query is already in flight");
    }

    let session = state.session.clone();
    tokio::spawn(async move {
        if session.send_preset(index).await == SendOutcome::Busy {
            warn!("Preset {} lost the in-flight race", index);
        }
    });

    accepted(format!("Preset {} dispatched", index))
}

/// POST /chat/clear
pub async fn clear_chat(State(state): State<AppState>) -> Json<Vec<Message>> {
    info!("Clearing chat");
    state.session.clear();
    Json(state.session.timeline())
}

/// GET /mode
pub async fn get_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: state.session.mode(),
    })
}

/// PUT /mode
pub async fn set_mode(
    State(state): State<AppState>,
    Json(req): Json<SetModeRequest>,
) -> Json<ModeResponse> {
    state.session.set_mode(req.mode);
    Json(ModeResponse { mode: req.mode })
}

/// POST /mode/cycle
pub async fn cycle_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: state.session.cycle_mode(),
    })
}

/// POST /voice/listen/toggle
pub async fn toggle_listening(State(state): State<AppState>) -> impl IntoResponse {
    let (status, body) = match state.session.toggle_listening() {
        ListenToggle::Started => (StatusCode::OK, ("listening", None)),
        ListenToggle::Stopped => (StatusCode::OK, ("idle", None)),
        ListenToggle::Unsupported(notice) => (StatusCode::NOT_IMPLEMENTED, ("unsupported", Some(notice))),
        ListenToggle::Failed(reason) => (StatusCode::SERVICE_UNAVAILABLE, ("failed", Some(reason))),
    };

    (
        status,
        Json(ToggleResponse {
            status: body.0.to_string(),
            message: body.1,
        }),
    )
}

/// POST /voice/record/toggle
pub async fn toggle_recording(State(state): State<AppState>) -> impl IntoResponse {
    let (status, label, message) = match state.session.toggle_recording().await {
        RecordToggle::Started { session_id } => (StatusCode::OK, "recording", Some(session_id.to_string())),
        RecordToggle::StopRequested { session_id } => {
            (StatusCode::OK, "stopping", Some(session_id.to_string()))
        }
        RecordToggle::MicrophoneUnavailable(notice) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(notice))
        }
        RecordToggle::Busy(state) => (StatusCode::CONFLICT, "busy", Some(format!("{:?}", state))),
    };

    (
        status,
        Json(ToggleResponse {
            status: label.to_string(),
            message,
        }),
    )
}

/// POST /widget/open
pub async fn open_widget(State(state): State<AppState>) -> impl IntoResponse {
    state.session.open();
    StatusCode::NO_CONTENT
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
