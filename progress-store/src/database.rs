use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use memory_scheduler::{MemoryState, ProgressRecord, StudyStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::models::{self, ItemProgress, SaveOutcome};
use crate::ProgressStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS user_word_progress (
        user_id TEXT NOT NULL,
        word_id TEXT NOT NULL,
        stability REAL NOT NULL,
        difficulty REAL NOT NULL,
        state INTEGER NOT NULL,
        lapses INTEGER NOT NULL,
        last_reviewed_at TEXT,
        next_review_at TEXT NOT NULL,
        status TEXT NOT NULL,
        PRIMARY KEY (user_id, word_id)
    );
    CREATE INDEX IF NOT EXISTS idx_user_word_progress_due
        ON user_word_progress (user_id, next_review_at);
";

/// Upsert that only replaces a stored row when the incoming review is at
/// least as recent. Timestamps are fixed-width RFC 3339 text, so string
/// comparison orders them chronologically.
const UPSERT: &str = "
    INSERT INTO user_word_progress
        (user_id, word_id, stability, difficulty, state, lapses,
         last_reviewed_at, next_review_at, status)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT (user_id, word_id) DO UPDATE SET
        stability = excluded.stability,
        difficulty = excluded.difficulty,
        state = excluded.state,
        lapses = excluded.lapses,
        last_reviewed_at = excluded.last_reviewed_at,
        next_review_at = excluded.next_review_at,
        status = excluded.status
    WHERE user_word_progress.last_reviewed_at IS NULL
       OR (excluded.last_reviewed_at IS NOT NULL
           AND excluded.last_reviewed_at >= user_word_progress.last_reviewed_at)
";

const SELECT_COLUMNS: &str =
    "word_id, stability, difficulty, state, lapses, last_reviewed_at, next_review_at";

/// Progress store backed by SQLite
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw column values of one row, before validation
struct RawRow {
    item_id: String,
    stability: f64,
    difficulty: f64,
    state: i64,
    lapses: i64,
    last_reviewed_at: Option<String>,
    next_review_at: String,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        normalize_timestamps(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query_items(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
        user_id: &str,
    ) -> Result<Vec<ItemProgress>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, read_row)?;

        let mut items = Vec::new();
        for row_result in rows {
            let raw = row_result?;
            let item_id = raw.item_id.clone();
            items.push(ItemProgress::new(item_id, raw.into_state(user_id)?));
        }
        Ok(items)
    }
}

impl ProgressStore for SqliteStore {
    fn load(&self, user_id: &str, item_id: &str) -> Result<Option<MemoryState>> {
        let raw = {
            let conn = self.conn()?;
            conn.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM user_word_progress WHERE user_id = ?1 AND word_id = ?2"
                ),
                params![user_id, item_id],
                read_row,
            )
            .optional()?
        };
        raw.map(|raw| raw.into_state(user_id)).transpose()
    }

    fn save(&self, user_id: &str, item_id: &str, state: &MemoryState) -> Result<SaveOutcome> {
        let record = ProgressRecord::from(state);
        let status = record.status.unwrap_or_else(|| StudyStatus::of(state));

        let changed = self.conn()?.execute(
            UPSERT,
            params![
                user_id,
                item_id,
                record.stability,
                record.difficulty,
                i64::from(record.state),
                record.lapses,
                record.last_reviewed_at.map(format_timestamp),
                format_timestamp(record.next_review_at),
                status.as_str(),
            ],
        )?;

        if changed == 0 {
            debug!("kept stored row for {user_id}/{item_id}");
            return Ok(SaveOutcome::Superseded);
        }
        debug!("saved {user_id}/{item_id} ({:?})", state.state);
        Ok(SaveOutcome::Written)
    }

    fn load_all(&self, user_id: &str) -> Result<Vec<ItemProgress>> {
        self.query_items(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM user_word_progress WHERE user_id = ?1 ORDER BY word_id"
            ),
            &[&user_id],
            user_id,
        )
    }

    fn due_items(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ItemProgress>> {
        let due = self.query_items(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM user_word_progress
                 WHERE user_id = ?1 AND last_reviewed_at IS NOT NULL AND next_review_at <= ?2"
            ),
            &[&user_id, &format_timestamp(now)],
            user_id,
        )?;
        Ok(models::sort_by_recall(due, now))
    }
}

/// Rewrite timestamps stored in any other RFC 3339 form (such as the
/// millisecond `...00.000Z` text older clients wrote) into the fixed-width
/// form the upsert compares. Unparseable values are left for `load` to report.
fn normalize_timestamps(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    let mut stmt = tx.prepare(
        "SELECT user_id, word_id, last_reviewed_at, next_review_at FROM user_word_progress
         WHERE length(next_review_at) != 30 OR length(last_reviewed_at) != 30",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    drop(stmt);

    let mut rewritten = 0;
    for (user_id, word_id, last_reviewed_at, next_review_at) in rows {
        let last = last_reviewed_at
            .as_deref()
            .map(|text| canonical_timestamp(text).unwrap_or_else(|| text.to_string()));
        let next = canonical_timestamp(&next_review_at).unwrap_or_else(|| next_review_at.clone());
        if last == last_reviewed_at && next == next_review_at {
            continue;
        }
        tx.execute(
            "UPDATE user_word_progress SET last_reviewed_at = ?1, next_review_at = ?2
             WHERE user_id = ?3 AND word_id = ?4",
            params![last, next, user_id, word_id],
        )?;
        rewritten += 1;
    }
    tx.commit()?;

    if rewritten > 0 {
        info!("normalized timestamps of {rewritten} progress rows");
    }
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        item_id: row.get(0)?,
        stability: row.get(1)?,
        difficulty: row.get(2)?,
        state: row.get(3)?,
        lapses: row.get(4)?,
        last_reviewed_at: row.get(5)?,
        next_review_at: row.get(6)?,
    })
}

impl RawRow {
    fn into_state(self, user_id: &str) -> Result<MemoryState> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            user_id: user_id.to_string(),
            item_id: self.item_id.clone(),
            reason,
        };

        let state = u8::try_from(self.state)
            .map_err(|_| invalid(format!("state code {} out of range", self.state)))?;
        let last_reviewed_at = self
            .last_reviewed_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(&invalid)?;
        let next_review_at = parse_timestamp(&self.next_review_at).map_err(&invalid)?;

        let record = ProgressRecord {
            stability: self.stability,
            difficulty: self.difficulty,
            state,
            lapses: self.lapses,
            last_reviewed_at,
            next_review_at,
            status: None,
        };
        MemoryState::try_from(record).map_err(|e| invalid(e.to_string()))
    }
}

/// Fixed-width RFC 3339 with nanoseconds, so text order is time order
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn canonical_timestamp(text: &str) -> Option<String> {
    parse_timestamp(text).ok().map(format_timestamp)
}

fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {text:?}: {e}"))
}
