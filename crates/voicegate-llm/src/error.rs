use thiserror::Error;

/// Errors surfaced by an `LlmStreamer` implementation.
#[derive(Debug, Error, Clone)]
pub enum LlmError {
    #[error("LLM authentication failed")]
    Auth,

    #[error("LLM rate limited, retry after {retry_after_ms}ms")]
    RateLimit { retry_after_ms: u64 },

    #[error("LLM upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
