//! Assistant session engine
//!
//! This module provides the pieces that turn user input into rendered answers:
//! - `ModeController` holding the response style read at dispatch time
//! - `QueryDispatcher` composing prompts and calling the answer service
//! - `RevealScheduler` animating a resolved answer into the timeline
//! - `AssistantSession` wiring those together with the voice inputs

mod dispatcher;
mod mode;
mod reveal;
mod session;
mod stats;

pub use dispatcher::{DispatchOutcome, QueryDispatcher};
pub use mode::{Mode, ModeController};
pub use reveal::{RevealOutcome, RevealScheduler};
pub use session::{AssistantSession, Platform, SendOutcome, Services};
pub use stats::SessionStats;
