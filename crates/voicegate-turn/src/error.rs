use thiserror::Error;

/// Precondition failures, surfaced before any event is emitted.
#[derive(Debug, Error, Clone)]
pub enum TurnError {
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("session {session_id} has no character bound")]
    CharacterNotBound { session_id: String },
}

pub type Result<T> = std::result::Result<T, TurnError>;
