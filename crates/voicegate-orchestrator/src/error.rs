use thiserror::Error;

use voicegate_llm::LlmError;
use voicegate_tts::TtsError;

/// A producer failure surfaced to the caller once the event stream ends.
/// Never returned mid-stream: per-fragment and partial-token progress is
/// always delivered first.
#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("tts error: {0}")]
    Tts(#[from] TtsError),
}
