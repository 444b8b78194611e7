//! Study statistics derived from stored progress.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;

use memory_scheduler::StudyStatus;

use crate::models::ItemProgress;

/// Reviewed items below this recall probability count as needing review
pub const REVIEW_RECALL_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub total: usize,
    /// Items reviewed at least once
    pub learned: usize,
    pub not_started: usize,
    pub completed: usize,
    /// Reviewed but not yet completed
    pub learning: usize,
    pub review_needed: usize,
    /// Learned share of all items, rounded to a whole percent
    pub progress_percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
}

pub fn overall_stats(items: &[ItemProgress], now: DateTime<Utc>) -> OverallStats {
    let total = items.len();
    if total == 0 {
        return OverallStats::default();
    }

    let (learned, completed, review_needed) = items
        .par_iter()
        .filter(|item| !item.memory.is_new())
        .map(|item| {
            let completed = usize::from(item.status() == StudyStatus::Completed);
            let review_needed = usize::from(item.recall(now) < REVIEW_RECALL_THRESHOLD);
            (1, completed, review_needed)
        })
        .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

    OverallStats {
        total,
        learned,
        not_started: total - learned,
        completed,
        learning: learned - completed,
        review_needed,
        progress_percentage: (learned as f64 / total as f64 * 100.0).round() as u32,
    }
}

/// Number of items whose last review fell on each UTC date
pub fn daily_activity(items: &[ItemProgress]) -> BTreeMap<NaiveDate, u32> {
    let mut activity = BTreeMap::new();
    for reviewed_at in items.iter().filter_map(|item| item.memory.last_reviewed_at) {
        *activity.entry(reviewed_at.date_naive()).or_insert(0) += 1;
    }
    activity
}

/// Current and longest run of consecutive study days.
///
/// The current run counts as broken once more than one day separates the
/// last study day from `today`.
pub fn learning_streak(activity: &BTreeMap<NaiveDate, u32>, today: NaiveDate) -> Streak {
    let mut days = activity
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(&day, _)| day);

    let Some(first) = days.next() else {
        return Streak::default();
    };

    let mut current = 1;
    let mut longest = 1;
    let mut previous = first;
    for day in days {
        current = if (day - previous).num_days() == 1 {
            current + 1
        } else {
            1
        };
        longest = longest.max(current);
        previous = day;
    }

    if (today - previous).num_days().abs() > 1 {
        current = 0;
    }
    Streak { current, longest }
}
