//! Error types
//!
//! The simulation itself never fails; errors come from the collaborators
//! around it (storage, rendering, audio) and from configuration loading.

use std::fmt;

use thiserror::Error;

/// Which collaborator reported a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Renderer,
    Audio,
    Input,
    Storage,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renderer => write!(f, "renderer"),
            Self::Audio => write!(f, "audio"),
            Self::Input => write!(f, "input"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: Collaborator,
        message: String,
    },
}

impl Error {
    pub fn collaborator(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
