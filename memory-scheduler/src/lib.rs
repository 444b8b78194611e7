//! Memory Scheduler - FSRS-family memory model and review scheduler
//!
//! Predicts how likely a learner is to recall a vocabulary item and moves the
//! item's memory state forward after each graded review:
//! - `model`: memory state and the exponential forgetting curve
//! - `scheduler`: the review transition function and due-date calculation
//! - `params`: the FSRS-5 weight table
//! - `record`: the persisted field layout
//! - `status` / `color`: projections used for filtering and display
//!
//! The functions at the bottom of this file are exported to Swift via UniFFI,
//! with timestamps as Unix milliseconds.

pub mod color;
pub mod config;
pub mod error;
pub mod grade;
pub mod model;
pub mod params;
pub mod record;
pub mod scheduler;
pub mod status;

use chrono::{DateTime, Utc};

pub use color::{memory_color, MemoryColor};
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use grade::{CardState, Grade};
pub use model::{recall_probability, MemoryState};
pub use params::{Parameters, DEFAULT_WEIGHTS};
pub use record::ProgressRecord;
pub use scheduler::{NextStates, ReviewOutcome, Scheduler};
pub use status::StudyStatus;

uniffi::setup_scaffolding!();

/// Memory state as seen from Swift
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct MemorySnapshot {
    pub stability: f64,
    pub difficulty: f64,
    pub lapses: u32,
    pub state: CardState,
    /// Unix milliseconds; None for a card that was never reviewed
    pub last_reviewed_at_ms: Option<i64>,
    pub due_at_ms: i64,
}

impl From<&MemoryState> for MemorySnapshot {
    fn from(m: &MemoryState) -> Self {
        Self {
            stability: m.stability,
            difficulty: m.difficulty,
            lapses: m.lapses,
            state: m.state,
            last_reviewed_at_ms: m.last_reviewed_at.map(|t| t.timestamp_millis()),
            due_at_ms: m.due_at.timestamp_millis(),
        }
    }
}

impl TryFrom<MemorySnapshot> for MemoryState {
    type Error = SchedulerError;

    fn try_from(m: MemorySnapshot) -> Result<Self, Self::Error> {
        Ok(Self {
            stability: m.stability,
            difficulty: m.difficulty,
            lapses: m.lapses,
            state: m.state,
            last_reviewed_at: m.last_reviewed_at_ms.map(timestamp).transpose()?,
            due_at: timestamp(m.due_at_ms)?,
        })
    }
}

/// Scheduling information for a single rating option
#[derive(Debug, Clone, Copy, uniffi::Record)]
pub struct SchedulingInfo {
    /// Updated memory state after the review
    pub memory: MemorySnapshot,
    /// Fractional days until the next review
    pub interval_days: f64,
}

impl From<&ReviewOutcome> for SchedulingInfo {
    fn from(outcome: &ReviewOutcome) -> Self {
        Self {
            memory: MemorySnapshot::from(&outcome.state),
            interval_days: outcome.interval_days,
        }
    }
}

/// All possible next states for each rating option
#[derive(Debug, Clone, uniffi::Record)]
pub struct ReviewPreview {
    pub again: SchedulingInfo,
    pub hard: SchedulingInfo,
    pub good: SchedulingInfo,
    pub easy: SchedulingInfo,
}

impl From<NextStates> for ReviewPreview {
    fn from(ns: NextStates) -> Self {
        Self {
            again: SchedulingInfo::from(&ns.again),
            hard: SchedulingInfo::from(&ns.hard),
            good: SchedulingInfo::from(&ns.good),
            easy: SchedulingInfo::from(&ns.easy),
        }
    }
}

/// Error types for scheduling operations
#[derive(Debug, Clone, thiserror::Error, uniffi::Error)]
pub enum ReviewError {
    #[error("Invalid grade: {message}")]
    InvalidGrade { message: String },
    #[error("Invalid memory state: {message}")]
    InvalidState { message: String },
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },
}

impl From<SchedulerError> for ReviewError {
    fn from(e: SchedulerError) -> Self {
        let message = e.to_string();
        match e {
            SchedulerError::InvalidGrade(_) => ReviewError::InvalidGrade { message },
            SchedulerError::InvalidState(_) => ReviewError::InvalidState { message },
            SchedulerError::InvalidConfig(_) | SchedulerError::Json(_) => {
                ReviewError::InvalidParameters { message }
            }
        }
    }
}

fn timestamp(ms: i64) -> Result<DateTime<Utc>, SchedulerError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| SchedulerError::InvalidState(format!("timestamp {ms} is out of range")))
}

fn scheduler_for(desired_retention: f64) -> Result<Scheduler, SchedulerError> {
    Scheduler::new(SchedulerConfig::default().with_desired_retention(desired_retention))
}

/// Memory state for a card that has never been reviewed
#[uniffi::export]
pub fn new_memory_state(now_ms: i64) -> Result<MemorySnapshot, ReviewError> {
    Ok(MemorySnapshot::from(&MemoryState::new(timestamp(now_ms)?)))
}

/// Schedule a card review with a specific grade
///
/// # Arguments
/// * `memory` - Current memory state
/// * `grade` - How well the card was recalled
/// * `now_ms` - Review time in Unix milliseconds
/// * `desired_retention` - Target recall probability at the due date (typically 0.9)
#[uniffi::export]
pub fn review(
    memory: MemorySnapshot,
    grade: Grade,
    now_ms: i64,
    desired_retention: f64,
) -> Result<MemorySnapshot, ReviewError> {
    let scheduler = scheduler_for(desired_retention)?;
    let state = MemoryState::try_from(memory)?;
    let next = scheduler.review(&state, grade, timestamp(now_ms)?)?;
    Ok(MemorySnapshot::from(&next))
}

/// Same as `review`, taking the numeric rating (1 = Again ... 4 = Easy)
#[uniffi::export]
pub fn review_rating(
    memory: MemorySnapshot,
    rating: u8,
    now_ms: i64,
    desired_retention: f64,
) -> Result<MemorySnapshot, ReviewError> {
    let grade = Grade::try_from(rating)?;
    review(memory, grade, now_ms, desired_retention)
}

/// Calculate next states for all rating options
#[uniffi::export]
pub fn preview(
    memory: MemorySnapshot,
    now_ms: i64,
    desired_retention: f64,
) -> Result<ReviewPreview, ReviewError> {
    let scheduler = scheduler_for(desired_retention)?;
    let state = MemoryState::try_from(memory)?;
    Ok(scheduler.preview(&state, timestamp(now_ms)?)?.into())
}

/// Probability of recall (0.0 - 1.0) at `now_ms`
#[uniffi::export]
pub fn current_recall(memory: MemorySnapshot, now_ms: i64) -> Result<f64, ReviewError> {
    let state = MemoryState::try_from(memory)?;
    Ok(recall_probability(&state, timestamp(now_ms)?))
}

/// CSS colour for a recall probability
#[uniffi::export]
pub fn memory_color_css(recall: f64) -> String {
    memory_color(recall).to_string()
}

/// Filtering label derived from a memory state
#[uniffi::export]
pub fn study_status(memory: MemorySnapshot) -> Result<StudyStatus, ReviewError> {
    let state = MemoryState::try_from(memory)?;
    Ok(StudyStatus::of(&state))
}
