//! Review grades and card lifecycle states.
//!
//! Both enums carry explicit numeric codes. The codes are what gets persisted
//! and what crosses the FFI boundary, so the conversions live here and are
//! tested rather than left to implicit `as` casts at call sites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// User rating for a review, ordered by recall quality
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Numeric rating, 1 (Again) through 4 (Easy)
    pub fn rating(self) -> u8 {
        self as u8
    }

    /// Map a quiz answer to a grade: correct answers count as Good
    pub fn from_answer(is_correct: bool) -> Self {
        if is_correct {
            Grade::Good
        } else {
            Grade::Again
        }
    }

    pub fn is_lapse(self) -> bool {
        self == Grade::Again
    }

    pub fn is_pass(self) -> bool {
        !self.is_lapse()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    /// Index into the per-grade initial stability table
    pub(crate) fn index(self) -> usize {
        self.rating() as usize - 1
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulerError;

    fn try_from(rating: u8) -> Result<Self, Self::Error> {
        match rating {
            1 => Ok(Grade::Again),
            2 => Ok(Grade::Hard),
            3 => Ok(Grade::Good),
            4 => Ok(Grade::Easy),
            other => Err(SchedulerError::InvalidGrade(format!(
                "rating {other} is outside 1..=4"
            ))),
        }
    }
}

impl FromStr for Grade {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            _ => Err(SchedulerError::InvalidGrade(format!("unknown grade label {s:?}"))),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse lifecycle stage of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    New = 0,
    Learning = 1,
    Review = 2,
    Relearning = 3,
}

impl CardState {
    /// Persisted small-integer code
    pub fn as_code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, SchedulerError> {
        match code {
            0 => Ok(CardState::New),
            1 => Ok(CardState::Learning),
            2 => Ok(CardState::Review),
            3 => Ok(CardState::Relearning),
            other => Err(SchedulerError::InvalidState(format!(
                "unknown card state code {other}"
            ))),
        }
    }

    /// Lifecycle stage reached after reviewing a card in this stage
    pub fn after(self, grade: Grade) -> CardState {
        match (self, grade) {
            (CardState::New, Grade::Easy) => CardState::Review,
            (CardState::New, _) => CardState::Learning,
            (CardState::Learning, Grade::Good | Grade::Easy) => CardState::Review,
            (CardState::Learning, _) => CardState::Learning,
            (CardState::Review | CardState::Relearning, Grade::Again) => CardState::Relearning,
            (CardState::Review | CardState::Relearning, _) => CardState::Review,
        }
    }
}
