use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// A single exchanged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub origin: Origin,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Origin::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Origin::Assistant, content)
    }

    fn new(origin: Origin, content: impl Into<String>) -> Self {
        Self {
            origin,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}
