//! Error types for Warden.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Spec parse error: {0}")]
    SpecParse(String),

    #[error("Integration not found: {0}")]
    IntegrationNotFound(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    /// True for failures the monitor treats as soft: log, skip, continue.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WardenError::Fetch(_) | WardenError::SpecParse(_) | WardenError::Pipeline(_)
        )
    }
}
