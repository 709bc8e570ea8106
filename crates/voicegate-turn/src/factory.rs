use std::sync::Arc;

use voicegate_llm::LlmStreamer;
use voicegate_storage::Character;
use voicegate_tts::TtsClient;

/// Builds the upstream collaborators for one character. A turn's
/// Orchestrator is always freshly instantiated (spec: no per-character
/// singleton), but the underlying HTTP clients a factory returns may be
/// pooled/reused across calls at the implementor's discretion.
pub trait OrchestratorCollaborators: Send + Sync {
    fn llm_for(&self, character: &Character) -> Arc<dyn LlmStreamer>;
    fn tts_for(&self, character: &Character) -> Arc<dyn TtsClient>;
}
