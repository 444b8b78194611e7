use thiserror::Error;

/// Error types produced by the memory model and scheduler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    #[error("Invalid grade: {0}")]
    InvalidGrade(String),

    #[error("Invalid memory state: {0}")]
    InvalidState(String),

    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON parsing error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for SchedulerError {
    fn from(e: serde_json::Error) -> Self {
        SchedulerError::Json(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
