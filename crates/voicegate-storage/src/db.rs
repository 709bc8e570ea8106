use rusqlite::Connection;

use crate::error::Result;

/// Initialise the characters/sessions/turns tables and their indexes.
///
/// Safe to call on every startup — uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS characters (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          TEXT NOT NULL,
            system_prompt TEXT NOT NULL DEFAULT 'You are a helpful assistant.',
            model         TEXT NOT NULL,
            voice         TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            session_id    TEXT PRIMARY KEY,
            character_id  INTEGER REFERENCES characters(id) ON DELETE SET NULL,
            created_at    TEXT NOT NULL,
            last_seen_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS turns (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id      TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
            user_text       TEXT NOT NULL,
            assistant_text  TEXT,
            ttft_ms         INTEGER,
            ttaf_ms         INTEGER,
            created_at      TEXT NOT NULL,
            completed_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_sessions_character ON sessions(character_id);",
    )?;
    Ok(())
}
