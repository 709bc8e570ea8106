use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::instrument;

use crate::db::init_db;
use crate::error::{Result, StorageError};
use crate::repo::StorageBackend;
use crate::types::{Character, Session, Turn, DEFAULT_SYSTEM_PROMPT};

/// `StorageBackend` backed by a single SQLite connection behind a `Mutex`.
///
/// A Mutex is sufficient here: turns are short-lived and storage calls are
/// small point queries, not long-held transactions.
pub struct SqliteStorage {
    db: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database file at `path` and run migrations.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Self { db: Mutex::new(conn) })
    }

    /// Wrap an already-open, already-migrated connection. Used by tests.
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    /// Fetch a turn row by id. Not part of `StorageBackend`: the core never
    /// reads a turn back, only writes it, but callers and tests benefit from
    /// being able to inspect the persisted row.
    pub fn get_turn(&self, turn_id: i64) -> Result<Option<Turn>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id, session_id, user_text, assistant_text, ttft_ms, ttaf_ms, created_at, completed_at
             FROM turns WHERE id = ?1",
            rusqlite::params![turn_id],
            row_to_turn,
        )
        .optional()
        .map_err(StorageError::from)
    }
}

impl StorageBackend for SqliteStorage {
    #[instrument(skip(self), fields(session_id))]
    fn upsert_session(&self, session_id: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO sessions (session_id, character_id, created_at, last_seen_at)
             VALUES (?1, NULL, ?2, ?2)
             ON CONFLICT(session_id) DO UPDATE SET last_seen_at = excluded.last_seen_at",
            rusqlite::params![session_id, now],
        )?;
        Ok(())
    }

    #[instrument(skip(self), fields(session_id, character_id))]
    fn create_session_with_character(&self, session_id: &str, character_id: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO sessions (session_id, character_id, created_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(session_id) DO UPDATE SET character_id = excluded.character_id,
                                                    last_seen_at = excluded.last_seen_at",
            rusqlite::params![session_id, character_id, now],
        )?;
        Ok(())
    }

    #[instrument(skip(self), fields(session_id))]
    fn get_session_with_character(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, Option<Character>)>> {
        let db = self.db.lock().unwrap();
        let session = db
            .query_row(
                "SELECT session_id, character_id, created_at, last_seen_at
                 FROM sessions WHERE session_id = ?1",
                rusqlite::params![session_id],
                row_to_session,
            )
            .optional()?;

        let Some(session) = session else {
            return Ok(None);
        };

        let character = match session.character_id {
            Some(character_id) => db
                .query_row(
                    "SELECT id, name, system_prompt, model, voice, created_at, updated_at
                     FROM characters WHERE id = ?1",
                    rusqlite::params![character_id],
                    row_to_character,
                )
                .optional()?,
            None => None,
        };

        Ok(Some((session, character)))
    }

    #[instrument(skip(self), fields(session_id))]
    fn update_session_last_seen(&self, session_id: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let rows_changed = db.execute(
            "UPDATE sessions SET last_seen_at = ?1 WHERE session_id = ?2",
            rusqlite::params![now, session_id],
        )?;
        if rows_changed == 0 {
            return Err(StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, user_text), fields(session_id))]
    fn create_turn(&self, session_id: &str, user_text: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO turns (session_id, user_text, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![session_id, user_text, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    #[instrument(skip(self), fields(turn_id, ms))]
    fn set_ttft(&self, turn_id: i64, ms: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE turns SET ttft_ms = ?1 WHERE id = ?2 AND ttft_ms IS NULL",
            rusqlite::params![ms, turn_id],
        )?;
        Ok(())
    }

    #[instrument(skip(self), fields(turn_id, ms))]
    fn set_ttaf(&self, turn_id: i64, ms: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE turns SET ttaf_ms = ?1 WHERE id = ?2 AND ttaf_ms IS NULL",
            rusqlite::params![ms, turn_id],
        )?;
        Ok(())
    }

    #[instrument(skip(self, assistant_text), fields(turn_id))]
    fn finalize_turn(&self, turn_id: i64, assistant_text: Option<&str>) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE turns SET assistant_text = ?1, completed_at = ?2
             WHERE id = ?3 AND completed_at IS NULL",
            rusqlite::params![assistant_text, now, turn_id],
        )?;
        Ok(())
    }

    #[instrument(skip(self), fields(character_id))]
    fn get_character(&self, character_id: i64) -> Result<Option<Character>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id, name, system_prompt, model, voice, created_at, updated_at
             FROM characters WHERE id = ?1",
            rusqlite::params![character_id],
            row_to_character,
        )
        .optional()
        .map_err(StorageError::from)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        session_id: row.get(0)?,
        character_id: row.get(1)?,
        created_at: row.get(2)?,
        last_seen_at: row.get(3)?,
    })
}

fn row_to_character(row: &rusqlite::Row<'_>) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get(0)?,
        name: row.get(1)?,
        system_prompt: row.get::<_, Option<String>>(2)?.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        model: row.get(3)?,
        voice: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_turn(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    Ok(Turn {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_text: row.get(2)?,
        assistant_text: row.get(3)?,
        ttft_ms: row.get(4)?,
        ttaf_ms: row.get(5)?,
        created_at: row.get(6)?,
        completed_at: row.get(7)?,
    })
}
