//! Memory state of one learner for one item, and the forgetting curve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::grade::CardState;
use crate::params::{MAX_DIFFICULTY, MIN_DIFFICULTY};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Cumulative memory state for a (user, item) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    /// Days; time-constant of the exponential forgetting curve
    pub stability: f64,
    /// Intrinsic item difficulty in [1, 10]
    pub difficulty: f64,
    /// Number of reviews graded Again
    pub lapses: u32,
    pub state: CardState,
    /// None until the first review
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub due_at: DateTime<Utc>,
}

impl MemoryState {
    /// Fresh state for an item that has never been reviewed
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            stability: 0.0,
            difficulty: 0.0,
            lapses: 0,
            state: CardState::New,
            last_reviewed_at: None,
            due_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_reviewed_at.is_none()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    /// Fractional days since the last review, never negative
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> f64 {
        match self.last_reviewed_at {
            Some(last) => days_between(last, now),
            None => 0.0,
        }
    }

    /// Check the invariants a scheduler-produced state always satisfies
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let Some(last) = self.last_reviewed_at else {
            if self.state != CardState::New {
                return Err(SchedulerError::InvalidState(format!(
                    "{:?} state without a review timestamp",
                    self.state
                )));
            }
            return Ok(());
        };

        if self.state == CardState::New {
            return Err(SchedulerError::InvalidState(
                "New state with a review timestamp".to_string(),
            ));
        }
        if !self.stability.is_finite() || self.stability <= 0.0 {
            return Err(SchedulerError::InvalidState(format!(
                "stability {} is not positive",
                self.stability
            )));
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(SchedulerError::InvalidState(format!(
                "difficulty {} is outside [{MIN_DIFFICULTY}, {MAX_DIFFICULTY}]",
                self.difficulty
            )));
        }
        if self.due_at < last {
            return Err(SchedulerError::InvalidState(format!(
                "due date {} precedes last review {}",
                self.due_at, last
            )));
        }
        Ok(())
    }
}

/// Probability that the item would be recalled at `now`.
///
/// `exp(-elapsed / stability)`; 0 for items never reviewed.
pub fn recall_probability(state: &MemoryState, now: DateTime<Utc>) -> f64 {
    let Some(last) = state.last_reviewed_at else {
        return 0.0;
    };
    retrievability(state.stability, days_between(last, now))
}

/// Forgetting curve for a given stability and elapsed time in days
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    if !stability.is_finite() || stability <= 0.0 {
        return 0.0;
    }
    let elapsed = if elapsed_days.is_nan() {
        0.0
    } else {
        elapsed_days.max(0.0)
    };
    (-elapsed / stability).exp().clamp(0.0, 1.0)
}

/// Elapsed days at which the curve reaches `retention`
pub fn days_until_retention(stability: f64, retention: f64) -> f64 {
    -stability * retention.ln()
}

pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).max(0.0)
}
