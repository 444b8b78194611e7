use chrono::{DateTime, Utc};
use memory_scheduler::{recall_probability, MemoryState, StudyStatus};

/// Stored memory state of one item for one user
#[derive(Debug, Clone, PartialEq)]
pub struct ItemProgress {
    pub item_id: String,
    pub memory: MemoryState,
}

impl ItemProgress {
    pub fn new(item_id: impl Into<String>, memory: MemoryState) -> Self {
        Self {
            item_id: item_id.into(),
            memory,
        }
    }

    pub fn recall(&self, now: DateTime<Utc>) -> f64 {
        recall_probability(&self.memory, now)
    }

    pub fn status(&self) -> StudyStatus {
        StudyStatus::of(&self.memory)
    }
}

/// Result of a save under the last-writer-wins rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The incoming state is now stored
    Written,
    /// A state with a later review was already stored and was kept
    Superseded,
}

impl SaveOutcome {
    pub fn is_written(self) -> bool {
        self == SaveOutcome::Written
    }
}

/// Sort items so the ones closest to being forgotten come first
pub(crate) fn sort_by_recall(items: Vec<ItemProgress>, now: DateTime<Utc>) -> Vec<ItemProgress> {
    use rayon::prelude::*;

    let mut keyed: Vec<(f64, ItemProgress)> = items
        .into_par_iter()
        .map(|item| (item.recall(now), item))
        .collect();
    keyed.par_sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.item_id.cmp(&b.1.item_id)));
    keyed.into_iter().map(|(_, item)| item).collect()
}
