//! In-process progress store.
//!
//! Also serves as the offline cache: the whole store can be written to and
//! restored from a JSON snapshot keyed by user and item id, with each entry
//! in the persisted `ProgressRecord` layout.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use log::debug;
use memory_scheduler::{MemoryState, ProgressRecord};

use crate::error::{Result, StoreError};
use crate::merge;
use crate::models::{ItemProgress, SaveOutcome};
use crate::ProgressStore;

type Snapshot = BTreeMap<String, BTreeMap<String, ProgressRecord>>;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// user id -> item id -> state
    users: RwLock<HashMap<String, HashMap<String, MemoryState>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize every stored state
    pub fn to_json(&self) -> Result<String> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        let snapshot: Snapshot = users
            .iter()
            .map(|(user_id, items)| {
                let records = items
                    .iter()
                    .map(|(item_id, state)| (item_id.clone(), ProgressRecord::from(state)))
                    .collect();
                (user_id.clone(), records)
            })
            .collect();
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Restore a store from a snapshot written by `to_json`
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        let mut users: HashMap<String, HashMap<String, MemoryState>> = HashMap::new();

        for (user_id, records) in snapshot {
            let items = users.entry(user_id.clone()).or_default();
            for (item_id, record) in records {
                let state = MemoryState::try_from(record).map_err(|e| StoreError::InvalidRecord {
                    user_id: user_id.clone(),
                    item_id: item_id.clone(),
                    reason: e.to_string(),
                })?;
                items.insert(item_id, state);
            }
        }

        Ok(Self {
            users: RwLock::new(users),
        })
    }

    /// Number of items stored for a user
    pub fn count(&self, user_id: &str) -> Result<usize> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(user_id).map_or(0, HashMap::len))
    }
}

impl ProgressStore for InMemoryStore {
    fn load(&self, user_id: &str, item_id: &str) -> Result<Option<MemoryState>> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users
            .get(user_id)
            .and_then(|items| items.get(item_id))
            .cloned())
    }

    fn save(&self, user_id: &str, item_id: &str, state: &MemoryState) -> Result<SaveOutcome> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let items = users.entry(user_id.to_string()).or_default();

        if let Some(current) = items.get(item_id) {
            if !merge::incoming_wins(current, state) {
                debug!("kept stored state for {user_id}/{item_id}");
                return Ok(SaveOutcome::Superseded);
            }
        }

        items.insert(item_id.to_string(), state.clone());
        debug!("saved {user_id}/{item_id} ({:?})", state.state);
        Ok(SaveOutcome::Written)
    }

    fn load_all(&self, user_id: &str) -> Result<Vec<ItemProgress>> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        let mut items: Vec<ItemProgress> = users
            .get(user_id)
            .map(|items| {
                items
                    .iter()
                    .map(|(item_id, state)| ItemProgress::new(item_id.clone(), state.clone()))
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use memory_scheduler::{CardState, Grade, Scheduler};
    use std::sync::Arc;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 7, 0, 0).unwrap()
    }

    #[test]
    fn test_load_missing_returns_fresh_state() {
        let store = InMemoryStore::new();
        assert_eq!(store.load("u1", "hola").unwrap(), None);

        let state = store.load_or_new("u1", "hola", t0()).unwrap();
        assert_eq!(state, MemoryState::new(t0()));
        assert_eq!(state.state, CardState::New);
    }

    #[test]
    fn test_record_review_chains_states() {
        let store = InMemoryStore::new();
        let scheduler = Scheduler::default();

        let (first, saved) = store
            .record_review(&scheduler, "u1", "hola", Grade::Good, t0())
            .unwrap();
        assert!(saved.is_written());

        let later = t0() + Duration::days(2);
        let (second, _) = store
            .record_review(&scheduler, "u1", "hola", Grade::Again, later)
            .unwrap();

        let expected = scheduler.review(&first.state, Grade::Again, later).unwrap();
        assert_eq!(second.state, expected);
        assert_eq!(store.load("u1", "hola").unwrap(), Some(expected));
        assert_eq!(second.state.lapses, 1);
    }

    #[test]
    fn test_stale_save_is_superseded() {
        let store = InMemoryStore::new();
        let scheduler = Scheduler::default();
        let newer = scheduler
            .review(&MemoryState::new(t0()), Grade::Easy, t0() + Duration::hours(2))
            .unwrap();
        let older = scheduler
            .review(&MemoryState::new(t0()), Grade::Again, t0())
            .unwrap();

        assert_eq!(store.save("u1", "gato", &newer).unwrap(), SaveOutcome::Written);
        assert_eq!(store.save("u1", "gato", &older).unwrap(), SaveOutcome::Superseded);
        assert_eq!(store.load("u1", "gato").unwrap(), Some(newer));
    }

    #[test]
    fn test_users_are_isolated() {
        let store = InMemoryStore::new();
        let state = Scheduler::default()
            .review(&MemoryState::new(t0()), Grade::Good, t0())
            .unwrap();
        store.save("u1", "perro", &state).unwrap();

        assert_eq!(store.load("u2", "perro").unwrap(), None);
        assert_eq!(store.count("u1").unwrap(), 1);
        assert_eq!(store.count("u2").unwrap(), 0);
    }

    #[test]
    fn test_due_items_sorted_by_recall() {
        let store = InMemoryStore::new();
        let scheduler = Scheduler::default();
        for (item, grade) in [("a", Grade::Good), ("b", Grade::Again), ("c", Grade::Easy)] {
            store
                .record_review(&scheduler, "u1", item, grade, t0())
                .unwrap();
        }
        store.save("u1", "unseen", &MemoryState::new(t0())).unwrap();

        let now = t0() + Duration::days(1);
        let due = store.due_items("u1", now).unwrap();
        let ids: Vec<&str> = due.iter().map(|p| p.item_id.as_str()).collect();
        // Easy has a due date further out than one day
        assert_eq!(ids, vec!["b", "a"]);
        assert!(due[0].recall(now) <= due[1].recall(now));
    }

    #[test]
    fn test_json_snapshot_round_trip() {
        let store = InMemoryStore::new();
        let scheduler = Scheduler::default();
        store
            .record_review(&scheduler, "u1", "casa", Grade::Hard, t0())
            .unwrap();
        store
            .record_review(&scheduler, "u2", "mesa", Grade::Easy, t0())
            .unwrap();
        store.save("u2", "silla", &MemoryState::new(t0())).unwrap();

        let json = store.to_json().unwrap();
        let restored = InMemoryStore::from_json(&json).unwrap();
        assert_eq!(restored.load_all("u1").unwrap(), store.load_all("u1").unwrap());
        assert_eq!(restored.load_all("u2").unwrap(), store.load_all("u2").unwrap());
    }

    #[test]
    fn test_corrupt_snapshot_is_rejected() {
        let json = r#"{"u1":{"casa":{
            "stability": -1.0, "difficulty": 5.0, "state": 2, "lapses": 0,
            "last_reviewed_at": "2024-04-01T07:00:00Z",
            "next_review_at": "2024-04-02T07:00:00Z"
        }}}"#;
        let err = InMemoryStore::from_json(json).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { ref item_id, .. } if item_id == "casa"));
    }

    #[test]
    fn test_concurrent_saves_keep_latest_review() {
        let store = Arc::new(InMemoryStore::new());
        let scheduler = Scheduler::default();
        let states: Vec<MemoryState> = (0..8)
            .map(|i| {
                let at = t0() + Duration::minutes(i);
                scheduler.review(&MemoryState::new(at), Grade::Good, at).unwrap()
            })
            .collect();
        let latest = states.last().cloned().unwrap();

        let handles: Vec<_> = states
            .into_iter()
            .rev()
            .map(|state| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.save("u1", "libro", &state).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load("u1", "libro").unwrap(), Some(latest));
    }
}
