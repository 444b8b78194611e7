//! Persisted field layout of a memory state.
//!
//! Field names and types are shared with rows already stored by earlier
//! clients (`user_word_progress`), so they must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::grade::CardState;
use crate::model::MemoryState;
use crate::status::StudyStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub stability: f64,
    pub difficulty: f64,
    pub state: u8,
    pub lapses: i64,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    /// Written for readers that filter on the label; ignored when parsing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StudyStatus>,
}

impl ProgressRecord {
    pub fn to_json(&self) -> Result<String, SchedulerError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SchedulerError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&MemoryState> for ProgressRecord {
    fn from(state: &MemoryState) -> Self {
        Self {
            stability: state.stability,
            difficulty: state.difficulty,
            state: state.state.as_code(),
            lapses: i64::from(state.lapses),
            last_reviewed_at: state.last_reviewed_at,
            next_review_at: state.due_at,
            status: Some(StudyStatus::of(state)),
        }
    }
}

impl TryFrom<ProgressRecord> for MemoryState {
    type Error = SchedulerError;

    fn try_from(record: ProgressRecord) -> Result<Self, Self::Error> {
        let lapses = u32::try_from(record.lapses).map_err(|_| {
            SchedulerError::InvalidState(format!("lapse count {} out of range", record.lapses))
        })?;
        let state = MemoryState {
            stability: record.stability,
            difficulty: record.difficulty,
            lapses,
            state: CardState::from_code(record.state)?,
            last_reviewed_at: record.last_reviewed_at,
            due_at: record.next_review_at,
        };
        state.validate()?;
        Ok(state)
    }
}
