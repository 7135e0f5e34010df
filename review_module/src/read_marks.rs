//! Local record of emails the reviewer has already opened.
//!
//! Survives restarts so the list can show read state before the server
//! catches up. Cleared on logout.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMark {
    pub user_id: String,
    pub item_id: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadMarkStoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("datetime parse error: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
}

#[derive(Debug, Clone)]
pub struct ReadMarkStore {
    path: PathBuf,
}

impl ReadMarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ReadMarkStoreError> {
        let store = Self { path: path.into() };
        let _ = store.open()?;
        Ok(store)
    }

    /// Returns true when the mark is new.
    pub fn mark(&self, user_id: &str, item_id: &str) -> Result<bool, ReadMarkStoreError> {
        let conn = self.open()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO read_marks (user_id, item_id, marked_at)
             VALUES (?1, ?2, ?3)",
            params![user_id, item_id, format_datetime(Utc::now())],
        )?;
        Ok(inserted > 0)
    }

    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<ReadMark>, ReadMarkStoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, item_id, marked_at
             FROM read_marks
             WHERE user_id = ?1
             ORDER BY marked_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut marks = Vec::new();
        for row in rows {
            let (user_id, item_id, marked_at) = row?;
            marks.push(ReadMark {
                user_id,
                item_id,
                marked_at: parse_datetime(&marked_at)?,
            });
        }
        Ok(marks)
    }

    pub fn item_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, ReadMarkStoreError> {
        Ok(self
            .list_for_user(user_id)?
            .into_iter()
            .map(|mark| mark.item_id)
            .collect())
    }

    /// Returns the number of marks removed.
    pub fn clear_user(&self, user_id: &str) -> Result<usize, ReadMarkStoreError> {
        let conn = self.open()?;
        let removed = conn.execute("DELETE FROM read_marks WHERE user_id = ?1", params![user_id])?;
        Ok(removed)
    }

    fn open(&self) -> Result<Connection, ReadMarkStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS read_marks (
                user_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                marked_at TEXT NOT NULL,
                PRIMARY KEY (user_id, item_id)
            )",
            [],
        )?;
        Ok(conn)
    }
}

fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
