//! Persistence of finished sessions and patient progress.
//!
//! The host only talks to [`PersistenceService`]. [`SqliteStore`] is the
//! on-disk adapter used by the binary; [`MemoryStore`] backs headless tests.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::session::{Mistake, SessionResult};

/// The two writes the engine needs from the outside world.
pub trait PersistenceService {
    fn record_session(
        &mut self,
        patient_id: &str,
        game_id: &str,
        assignment_id: Option<&str>,
        result: &SessionResult,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn increment_patient_stars(
        &mut self,
        patient_id: &str,
        stars: u8,
        last_played_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

impl<P: PersistenceService + ?Sized> PersistenceService for Box<P> {
    fn record_session(
        &mut self,
        patient_id: &str,
        game_id: &str,
        assignment_id: Option<&str>,
        result: &SessionResult,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).record_session(patient_id, game_id, assignment_id, result, played_at)
    }

    fn increment_patient_stars(
        &mut self,
        patient_id: &str,
        stars: u8,
        last_played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).increment_patient_stars(patient_id, stars, last_played_at)
    }
}

/// A stored play-through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub patient_id: String,
    pub game_id: String,
    pub assignment_id: Option<String>,
    pub result: SessionResult,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientStats {
    pub patient_id: String,
    pub total_stars: u32,
    pub sessions_played: u32,
    pub last_played_at: Option<DateTime<Utc>>,
}

impl PatientStats {
    fn empty(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            total_stars: 0,
            sessions_played: 0,
            last_played_at: None,
        }
    }
}

/// Per-game roll-up for one patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub game_id: String,
    pub sessions: u32,
    pub average_accuracy: f64,
    pub best_stars: u8,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS game_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id TEXT NOT NULL,
    game_id TEXT NOT NULL,
    assignment_id TEXT,
    score INTEGER NOT NULL,
    stars_earned INTEGER NOT NULL,
    accuracy INTEGER NOT NULL,
    items_completed INTEGER NOT NULL,
    items_total INTEGER NOT NULL,
    mistakes TEXT NOT NULL,
    duration_seconds INTEGER NOT NULL,
    played_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_game_sessions_patient ON game_sessions(patient_id);
CREATE TABLE IF NOT EXISTS patient_stats (
    patient_id TEXT PRIMARY KEY,
    total_stars INTEGER NOT NULL DEFAULT 0,
    sessions_played INTEGER NOT NULL DEFAULT 0,
    last_played_at TEXT
);
"#;

/// SQLite-backed store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened session store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Where the binary keeps its database unless told otherwise.
    pub fn default_path() -> PathBuf {
        AppDirs::db_path().unwrap_or_else(|| PathBuf::from("chatterbox.db"))
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Newest first.
    pub fn recent_sessions(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT patient_id, game_id, assignment_id, score, stars_earned, accuracy,
                   items_completed, items_total, mistakes, duration_seconds, played_at
            FROM game_sessions
            WHERE patient_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![patient_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u8>(4)?,
                row.get::<_, u8>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, u32>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, u64>(9)?,
                row.get::<_, String>(10)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                patient_id,
                game_id,
                assignment_id,
                score,
                stars_earned,
                accuracy,
                items_completed,
                items_total,
                mistakes,
                duration_seconds,
                played_at,
            ) = row?;
            let mistakes: Vec<Mistake> = serde_json::from_str(&mistakes)?;
            records.push(SessionRecord {
                patient_id,
                game_id,
                assignment_id,
                result: SessionResult {
                    score,
                    stars_earned,
                    accuracy,
                    items_completed,
                    items_total,
                    mistakes,
                    duration_seconds,
                },
                played_at: parse_timestamp(&played_at)?,
            });
        }
        Ok(records)
    }

    pub fn patient_stats(&self, patient_id: &str) -> Result<Option<PatientStats>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT total_stars, sessions_played, last_played_at FROM patient_stats WHERE patient_id = ?1",
                [patient_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((total_stars, sessions_played, last_played_at)) = row else {
            return Ok(None);
        };
        Ok(Some(PatientStats {
            patient_id: patient_id.to_string(),
            total_stars,
            sessions_played,
            last_played_at: last_played_at.as_deref().map(parse_timestamp).transpose()?,
        }))
    }

    pub fn game_summary(&self, patient_id: &str) -> Result<Vec<GameSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT game_id, COUNT(*), AVG(accuracy), MAX(stars_earned)
            FROM game_sessions
            WHERE patient_id = ?1
            GROUP BY game_id
            ORDER BY game_id
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(GameSummary {
                game_id: row.get(0)?,
                sessions: row.get(1)?,
                average_accuracy: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                best_stars: row.get::<_, Option<u8>>(3)?.unwrap_or(0),
            })
        })?;

        let mut summary = Vec::new();
        for row in rows {
            summary.push(row?);
        }
        Ok(summary)
    }
}

impl PersistenceService for SqliteStore {
    fn record_session(
        &mut self,
        patient_id: &str,
        game_id: &str,
        assignment_id: Option<&str>,
        result: &SessionResult,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mistakes = serde_json::to_string(&result.mistakes)?;
        self.conn.execute(
            r#"
            INSERT INTO game_sessions
            (patient_id, game_id, assignment_id, score, stars_earned, accuracy,
             items_completed, items_total, mistakes, duration_seconds, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                patient_id,
                game_id,
                assignment_id,
                result.score,
                result.stars_earned,
                result.accuracy,
                result.items_completed,
                result.items_total,
                mistakes,
                result.duration_seconds,
                played_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn increment_patient_stars(
        &mut self,
        patient_id: &str,
        stars: u8,
        last_played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO patient_stats (patient_id, total_stars, sessions_played, last_played_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(patient_id) DO UPDATE SET
                total_stars = total_stars + excluded.total_stars,
                sessions_played = sessions_played + 1,
                last_played_at = excluded.last_played_at
            "#,
            params![patient_id, stars, last_played_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("bad timestamp {raw:?}: {e}")))
}

/// In-memory store with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Vec<SessionRecord>,
    patients: HashMap<String, PatientStats>,
    fail_record: bool,
    fail_stars: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails.
    pub fn unavailable() -> Self {
        Self {
            fail_record: true,
            fail_stars: true,
            ..Self::default()
        }
    }

    pub fn fail_record(&mut self, fail: bool) {
        self.fail_record = fail;
    }

    pub fn fail_stars(&mut self, fail: bool) {
        self.fail_stars = fail;
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn patient(&self, patient_id: &str) -> Option<&PatientStats> {
        self.patients.get(patient_id)
    }
}

impl PersistenceService for MemoryStore {
    fn record_session(
        &mut self,
        patient_id: &str,
        game_id: &str,
        assignment_id: Option<&str>,
        result: &SessionResult,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_record {
            return Err(StoreError::Unavailable("record_session".into()));
        }
        self.sessions.push(SessionRecord {
            patient_id: patient_id.to_string(),
            game_id: game_id.to_string(),
            assignment_id: assignment_id.map(str::to_string),
            result: result.clone(),
            played_at,
        });
        Ok(())
    }

    fn increment_patient_stars(
        &mut self,
        patient_id: &str,
        stars: u8,
        last_played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_stars {
            return Err(StoreError::Unavailable("increment_patient_stars".into()));
        }
        let entry = self
            .patients
            .entry(patient_id.to_string())
            .or_insert_with(|| PatientStats::empty(patient_id));
        entry.total_stars += u32::from(stars);
        entry.sessions_played += 1;
        entry.last_played_at = Some(last_played_at);
        Ok(())
    }
}
