use async_trait::async_trait;

use voicegate_protocol::AudioFormat;

use crate::error::Result;

/// A synthesized audio fragment.
pub struct Synthesized {
    pub format: AudioFormat,
    pub data: Vec<u8>,
}

/// The TTS producer's collaborator: turns a text fragment into an audio
/// fragment. Called once per chunk the text chunker emits, not once per
/// turn — the orchestrator pipelines synthesis concurrently with LLM
/// token streaming.
#[async_trait]
pub trait TtsClient: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Synthesized>;
}
