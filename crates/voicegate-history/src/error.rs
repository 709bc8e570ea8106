use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
