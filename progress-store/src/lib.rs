//! Progress Store - per-item study progress for the memory scheduler
//!
//! Persists one `MemoryState` per (user, item) pair and answers the questions
//! the study screens ask about them:
//! - `memory`: in-process store that doubles as the offline JSON cache
//! - `database`: SQLite store using the `user_word_progress` layout
//! - `merge`: last-writer-wins rule for saves from several devices
//! - `stats`: totals, daily activity and study streaks
//!
//! Stores never compute memory states themselves; `record_review` loads the
//! previous state, hands it to the scheduler and saves the result.

pub mod database;
pub mod error;
pub mod memory;
pub mod merge;
pub mod models;
pub mod stats;

use chrono::{DateTime, Utc};
use log::warn;
use memory_scheduler::{Grade, MemoryState, ReviewOutcome, Scheduler};

pub use database::SqliteStore;
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use models::{ItemProgress, SaveOutcome};

/// Key-value storage for memory states keyed by user and item
pub trait ProgressStore: Send + Sync {
    /// Stored state, or None if the item was never saved for this user
    fn load(&self, user_id: &str, item_id: &str) -> Result<Option<MemoryState>>;

    /// Store `state` unless a state with a later review is already stored
    fn save(&self, user_id: &str, item_id: &str, state: &MemoryState) -> Result<SaveOutcome>;

    fn load_all(&self, user_id: &str) -> Result<Vec<ItemProgress>>;

    /// Stored state, or a fresh never-reviewed state
    fn load_or_new(&self, user_id: &str, item_id: &str, now: DateTime<Utc>) -> Result<MemoryState> {
        Ok(self
            .load(user_id, item_id)?
            .unwrap_or_else(|| MemoryState::new(now)))
    }

    /// Reviewed items whose due date has passed, lowest recall first
    fn due_items(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ItemProgress>> {
        let due = self
            .load_all(user_id)?
            .into_iter()
            .filter(|item| !item.memory.is_new() && item.memory.is_due(now))
            .collect();
        Ok(models::sort_by_recall(due, now))
    }

    /// Load, review and save one item
    fn record_review(
        &self,
        scheduler: &Scheduler,
        user_id: &str,
        item_id: &str,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<(ReviewOutcome, SaveOutcome)> {
        let current = self.load_or_new(user_id, item_id, now)?;
        let outcome = scheduler.review_detailed(&current, grade, now)?;
        let saved = self.save(user_id, item_id, &outcome.state)?;
        if !saved.is_written() {
            warn!("review of {user_id}/{item_id} at {now} superseded by a later review");
        }
        Ok((outcome, saved))
    }
}
