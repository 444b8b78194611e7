use memory_scheduler::SchedulerError;
use thiserror::Error;

/// Error types that can occur while loading or saving study progress
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("JSON parsing error: {0}")]
    Json(String),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Invalid stored record for {user_id}/{item_id}: {reason}")]
    InvalidRecord {
        user_id: String,
        item_id: String,
        reason: String,
    },

    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
