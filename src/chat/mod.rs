//! Message store
//!
//! The conversation timeline rendered to the user and the append-only
//! history of finalized messages.

mod message;
mod store;

pub use message::{Message, Origin};
pub use store::{MessageStore, Slot};
pub(crate) use store::RevealWriter;
