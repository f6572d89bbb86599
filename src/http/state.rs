use crate::session::AssistantSession;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The conversation driven by this control surface
    pub session: AssistantSession,
}

impl AppState {
    pub fn new(session: AssistantSession) -> Self {
        Self { session }
    }
}
