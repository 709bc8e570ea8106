use async_trait::async_trait;
use tokio::sync::mpsc;

use voicegate_history::Message;

use crate::error::Result;
use crate::stream::LlmEvent;

/// The token producer's collaborator: streams an assistant reply for a
/// user utterance, given the session's rolling history as context.
///
/// Implementations push `LlmEvent`s onto `tx` as they become available
/// rather than returning a complete response, so the orchestrator can
/// begin chunking text for TTS before the full reply has arrived.
#[async_trait]
pub trait LlmStreamer: Send + Sync {
    async fn stream(&self, user_text: &str, history: &[Message], tx: mpsc::Sender<LlmEvent>) -> Result<()>;
}
