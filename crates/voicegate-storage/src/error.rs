use thiserror::Error;

/// Errors surfaced by the storage backend (the transactional row store).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("character not found: {character_id}")]
    CharacterNotFound { character_id: i64 },

    #[error("turn not found: {turn_id}")]
    TurnNotFound { turn_id: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
