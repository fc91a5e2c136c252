use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

use super::{AttemptRepository, Participant, UserProfile, MAX_ATTEMPTS_PER_USER};
use crate::attempt::{AttemptRecord, ExerciseMode};
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        wpm INTEGER NOT NULL,
        accuracy INTEGER NOT NULL,
        error_count INTEGER NOT NULL,
        correct_chars INTEGER NOT NULL,
        total_chars INTEGER NOT NULL,
        elapsed_secs REAL NOT NULL,
        mode TEXT NOT NULL,
        magnitude INTEGER NOT NULL,
        language TEXT NOT NULL,
        completed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_attempts_user ON attempts(user_id);
"#;

const SELECT_ATTEMPTS: &str = r#"
    SELECT wpm, accuracy, error_count, correct_chars, total_chars, elapsed_secs,
           mode, magnitude, language, completed_at, user_id
    FROM attempts
    WHERE user_id IS ?1
    ORDER BY id
"#;

/// SQLite-backed attempt history.
#[derive(Debug)]
pub struct SqliteAttemptRepository {
    conn: Connection,
}

impl SqliteAttemptRepository {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening attempt database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Drop all but the newest attempts for `user_id`.
    fn trim_to_retention(conn: &Connection, user_id: Option<&str>) -> Result<()> {
        let removed = conn.execute(
            r#"
            DELETE FROM attempts
            WHERE user_id IS ?1
              AND id NOT IN (
                SELECT id FROM attempts WHERE user_id IS ?1 ORDER BY id DESC LIMIT ?2
              )
            "#,
            params![user_id, MAX_ATTEMPTS_PER_USER as i64],
        )?;
        if removed > 0 {
            debug!(user = ?user_id, removed, "trimmed attempts to retention limit");
        }
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord(format!("bad timestamp `{raw}`: {e}")))
}

/// Raw columns for one attempt row; decoded outside the rusqlite closure so
/// that bad values surface as [`Error::CorruptRecord`].
struct AttemptRow {
    wpm: u32,
    accuracy: u32,
    error_count: i64,
    correct_chars: i64,
    total_chars: i64,
    elapsed_secs: f64,
    mode: String,
    magnitude: u32,
    language: String,
    completed_at: String,
    user_id: Option<String>,
}

impl AttemptRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            wpm: row.get(0)?,
            accuracy: row.get(1)?,
            error_count: row.get(2)?,
            correct_chars: row.get(3)?,
            total_chars: row.get(4)?,
            elapsed_secs: row.get(5)?,
            mode: row.get(6)?,
            magnitude: row.get(7)?,
            language: row.get(8)?,
            completed_at: row.get(9)?,
            user_id: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<AttemptRecord> {
        let exercise_mode = ExerciseMode::parse(&self.mode)
            .ok_or_else(|| Error::CorruptRecord(format!("unknown mode `{}`", self.mode)))?;
        let count = |value: i64, column: &str| {
            usize::try_from(value)
                .map_err(|_| Error::CorruptRecord(format!("negative {column}: {value}")))
        };
        Ok(AttemptRecord {
            wpm: self.wpm,
            accuracy: self.accuracy,
            error_count: count(self.error_count, "error_count")?,
            correct_char_count: count(self.correct_chars, "correct_chars")?,
            total_typed_char_count: count(self.total_chars, "total_chars")?,
            elapsed_seconds: self.elapsed_secs,
            exercise_mode,
            exercise_magnitude: self.magnitude,
            language: self.language,
            completed_at: parse_timestamp(&self.completed_at)?,
            user_id: self.user_id,
        })
    }
}

impl AttemptRepository for SqliteAttemptRepository {
    fn register_user(&mut self, profile: UserProfile) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (user_id, display_name, created_at) VALUES (?1, ?2, ?3)",
            params![
                profile.user_id,
                profile.display_name,
                profile.created_at.to_rfc3339()
            ],
        )?;
        if inserted > 0 {
            info!(user = %profile.user_id, "registered user");
        }
        Ok(())
    }

    fn append(&mut self, record: AttemptRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO attempts
            (user_id, wpm, accuracy, error_count, correct_chars, total_chars,
             elapsed_secs, mode, magnitude, language, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.user_id,
                record.wpm,
                record.accuracy,
                record.error_count as i64,
                record.correct_char_count as i64,
                record.total_typed_char_count as i64,
                record.elapsed_seconds,
                record.exercise_mode.to_string(),
                record.exercise_magnitude,
                record.language,
                record.completed_at.to_rfc3339(),
            ],
        )?;
        Self::trim_to_retention(&tx, record.user_id.as_deref())?;
        tx.commit()?;
        debug!(user = ?record.user_id, wpm = record.wpm, "stored attempt");
        Ok(())
    }

    fn attempts_for(&self, user_id: Option<&str>) -> Result<Vec<AttemptRecord>> {
        let mut stmt = self.conn.prepare(SELECT_ATTEMPTS)?;
        let rows = stmt.query_map(params![user_id], AttemptRow::from_row)?;

        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(row?.into_record()?);
        }
        Ok(attempts)
    }

    fn population(&self) -> Result<Vec<Participant>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, display_name, created_at FROM users ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut participants = Vec::new();
        for row in rows {
            let (user_id, display_name, created_at) = row?;
            let attempts = self.attempts_for(Some(&user_id))?;
            let profile = UserProfile {
                user_id,
                display_name,
                created_at: parse_timestamp(&created_at)?,
            };
            participants.push(Participant::new(profile, attempts));
        }
        Ok(participants)
    }
}
