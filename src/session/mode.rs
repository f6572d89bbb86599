use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Response style applied to outbound queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Assistant,
    Creative,
    Precise,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Assistant, Mode::Creative, Mode::Precise];

    pub fn next(self) -> Mode {
        match self {
            Mode::Assistant => Mode::Creative,
            Mode::Creative => Mode::Precise,
            Mode::Precise => Mode::Assistant,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Assistant => "assistant",
            Mode::Creative => "creative",
            Mode::Precise => "precise",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mode: {}", s))
    }
}

/// Holds the current mode. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: Arc<Mutex<Mode>>,
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            mode: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn current(&self) -> Mode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, mode: Mode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
        info!("Mode set to {}", mode);
    }

    /// Rotate assistant -> creative -> precise -> assistant
    pub fn cycle(&self) -> Mode {
        let mut mode = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        *mode = mode.next();
        info!("Mode cycled to {}", *mode);
        *mode
    }
}
