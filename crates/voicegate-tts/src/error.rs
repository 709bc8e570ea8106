use thiserror::Error;

/// Errors surfaced by a `TtsClient` implementation.
#[derive(Debug, Error, Clone)]
pub enum TtsError {
    #[error("TTS authentication failed")]
    Auth,

    #[error("TTS rate limited, retry after {retry_after_ms}ms")]
    RateLimit { retry_after_ms: u64 },

    #[error("TTS upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("TTS request timed out")]
    Timeout,

    #[error("TTS network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, TtsError>;
