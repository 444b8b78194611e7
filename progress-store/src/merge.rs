//! Last-writer-wins resolution for concurrent saves of the same item.

use memory_scheduler::MemoryState;

/// Whether `incoming` should replace `current`.
///
/// The state with the later `last_reviewed_at` wins. A reviewed state beats a
/// never-reviewed one, and on a tie the incoming write wins.
pub fn incoming_wins(current: &MemoryState, incoming: &MemoryState) -> bool {
    match (current.last_reviewed_at, incoming.last_reviewed_at) {
        (_, None) => current.last_reviewed_at.is_none(),
        (None, Some(_)) => true,
        (Some(stored), Some(new)) => new >= stored,
    }
}

/// The state that survives a conflict between `current` and `incoming`
pub fn resolve(current: MemoryState, incoming: MemoryState) -> MemoryState {
    if incoming_wins(&current, &incoming) {
        incoming
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use memory_scheduler::{Grade, Scheduler};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0).unwrap()
    }

    fn reviewed_at(at: DateTime<Utc>, grade: Grade) -> MemoryState {
        Scheduler::default()
            .review(&MemoryState::new(at), grade, at)
            .unwrap()
    }

    #[test]
    fn test_later_review_wins() {
        let phone = reviewed_at(t0(), Grade::Good);
        let laptop = reviewed_at(t0() + Duration::minutes(5), Grade::Again);

        assert_eq!(resolve(phone.clone(), laptop.clone()), laptop);
        assert_eq!(resolve(laptop.clone(), phone), laptop);
    }

    #[test]
    fn test_reviewed_beats_fresh() {
        let fresh = MemoryState::new(t0() + Duration::days(3));
        let reviewed = reviewed_at(t0(), Grade::Hard);

        assert!(!incoming_wins(&reviewed, &fresh));
        assert!(incoming_wins(&fresh, &reviewed));
    }

    #[test]
    fn test_tie_keeps_incoming() {
        let a = reviewed_at(t0(), Grade::Good);
        let b = reviewed_at(t0(), Grade::Easy);
        assert_eq!(resolve(a, b.clone()), b);

        let fresh_a = MemoryState::new(t0());
        let fresh_b = MemoryState::new(t0() + Duration::days(1));
        assert_eq!(resolve(fresh_a, fresh_b.clone()), fresh_b);
    }
}
