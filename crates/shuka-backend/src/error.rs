//! Error Types for the Scripture Backend

use shuka_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// `success: false` reported by the backend
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Failures the search step reports as "nothing found"
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Backend(_) | Self::Serialization(_))
    }
}

impl From<BackendError> for AgentError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Config(msg) => Self::Config(msg),
            other => Self::Search(other.to_string()),
        }
    }
}
