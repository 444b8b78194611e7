//! Review transition function.
//!
//! `Scheduler::review` takes the previous memory state, the learner's grade
//! and the review time, and returns the next state with its due date. It
//! never touches storage.

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::grade::{CardState, Grade};
use crate::model::{days_until_retention, recall_probability, MemoryState};
use crate::params::Parameters;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A review transition together with the values that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub grade: Grade,
    pub previous_state: CardState,
    /// Recall probability at review time (0 for a first review)
    pub retrievability: f64,
    pub elapsed_days: f64,
    /// Days from the review until `state.due_at`
    pub interval_days: f64,
    pub state: MemoryState,
}

/// Candidate outcomes for each grade
#[derive(Debug, Clone, PartialEq)]
pub struct NextStates {
    pub again: ReviewOutcome,
    pub hard: ReviewOutcome,
    pub good: ReviewOutcome,
    pub easy: ReviewOutcome,
}

impl NextStates {
    pub fn get(&self, grade: Grade) -> &ReviewOutcome {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scheduler {
    params: Parameters,
    desired_retention: f64,
    maximum_interval_days: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        let config = SchedulerConfig::default();
        Self {
            params: config.weights,
            desired_retention: config.desired_retention,
            maximum_interval_days: config.maximum_interval_days,
        }
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            params: config.weights,
            desired_retention: config.desired_retention,
            maximum_interval_days: config.maximum_interval_days,
        })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn desired_retention(&self) -> f64 {
        self.desired_retention
    }

    /// Next memory state after reviewing with `grade` at `now`
    pub fn review(
        &self,
        state: &MemoryState,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<MemoryState, SchedulerError> {
        self.review_detailed(state, grade, now).map(|outcome| outcome.state)
    }

    /// Like [`Scheduler::review`], but also returns the retrievability and
    /// interval used for the transition
    pub fn review_detailed(
        &self,
        state: &MemoryState,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulerError> {
        state.validate()?;

        let elapsed_days = state.elapsed_days(now);
        let (retrievability, stability, difficulty) = if state.is_new() {
            (
                0.0,
                self.params.initial_stability(grade),
                self.params.initial_difficulty(grade),
            )
        } else {
            let r = recall_probability(state, now);
            let (d, s) = (state.difficulty, state.stability);
            let stability = if grade.is_lapse() {
                self.params.forget_stability(d, s, r)
            } else {
                self.params.recall_stability(d, s, r, grade)
            };
            (r, stability, self.params.next_difficulty(d, grade))
        };

        let lapses = if grade.is_lapse() {
            state.lapses.saturating_add(1)
        } else {
            state.lapses
        };
        let interval_days = self.next_interval(stability);
        let due_at = due_date(now, interval_days)?;
        let next = MemoryState {
            stability,
            difficulty,
            lapses,
            state: state.state.after(grade),
            last_reviewed_at: Some(now),
            due_at,
        };

        debug!(
            "review {grade}: {:?} -> {:?}, r={retrievability:.3}, s {:.3} -> {:.3}, interval {interval_days:.2}d",
            state.state, next.state, state.stability, next.stability
        );

        Ok(ReviewOutcome {
            grade,
            previous_state: state.state,
            retrievability,
            elapsed_days,
            interval_days,
            state: next,
        })
    }

    /// Outcomes for all four grades, for labelling answer buttons
    pub fn preview(
        &self,
        state: &MemoryState,
        now: DateTime<Utc>,
    ) -> Result<NextStates, SchedulerError> {
        Ok(NextStates {
            again: self.review_detailed(state, Grade::Again, now)?,
            hard: self.review_detailed(state, Grade::Hard, now)?,
            good: self.review_detailed(state, Grade::Good, now)?,
            easy: self.review_detailed(state, Grade::Easy, now)?,
        })
    }

    /// Days until recall for `stability` drops to the desired retention
    pub fn next_interval(&self, stability: f64) -> f64 {
        days_until_retention(stability, self.desired_retention)
            .clamp(0.0, self.maximum_interval_days)
    }
}

/// `now` plus a fractional day count, or an error past chrono's range
fn due_date(now: DateTime<Utc>, interval_days: f64) -> Result<DateTime<Utc>, SchedulerError> {
    TimeDelta::try_milliseconds((interval_days * MILLIS_PER_DAY).round() as i64)
        .and_then(|interval| now.checked_add_signed(interval))
        .ok_or_else(|| {
            SchedulerError::InvalidState(format!(
                "due date {interval_days:.1} days after {now} is out of range"
            ))
        })
}
