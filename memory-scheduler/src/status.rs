use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grade::CardState;
use crate::model::MemoryState;

/// Display label used for filtering word lists.
///
/// Always derived from a [`MemoryState`]; the persisted copy is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum StudyStatus {
    NotStarted,
    InProgress,
    ReviewNeeded,
    Completed,
}

impl StudyStatus {
    pub fn of(state: &MemoryState) -> Self {
        if state.is_new() {
            return StudyStatus::NotStarted;
        }
        match state.state {
            CardState::New => StudyStatus::NotStarted,
            CardState::Learning => StudyStatus::InProgress,
            CardState::Relearning => StudyStatus::ReviewNeeded,
            CardState::Review => StudyStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StudyStatus::NotStarted => "not_started",
            StudyStatus::InProgress => "in_progress",
            StudyStatus::ReviewNeeded => "review_needed",
            StudyStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
