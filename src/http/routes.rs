use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Conversation
        .route("/chat/timeline", get(handlers::get_timeline))
        .route("/chat/history", get(handlers::get_history))
        .route("/chat/status", get(handlers::get_status))
        .route("/chat/send", post(handlers::send_message))
        .route("/chat/clear", post(handlers::clear_chat))
        .route("/chat/presets", get(handlers::list_presets))
        .route("/chat/presets/:index", post(handlers::send_preset))
        // Response style
        .route("/mode", get(handlers::get_mode).put(handlers::set_mode))
        .route("/mode/cycle", post(handlers::cycle_mode))
        // Voice input
        .route("/voice/listen/toggle", post(handlers::toggle_listening))
        .route("/voice/record/toggle", post(handlers::toggle_recording))
        .route("/widget/open", post(handlers::open_widget))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
