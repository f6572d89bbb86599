//! HTTP control API for the widget front end
//!
//! Each route invokes one session operation:
//! - GET /chat/timeline, /chat/history, /chat/status - Read the conversation
//! - POST /chat/send, /chat/presets/:index - Dispatch a query
//! - POST /chat/clear - Reset the timeline
//! - GET|PUT /mode, POST /mode/cycle - Response style
//! - POST /voice/listen/toggle, /voice/record/toggle - Voice input
//! - POST /widget/open - Play the open cue
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
