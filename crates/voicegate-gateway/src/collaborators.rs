use std::sync::Arc;

use std::str::FromStr;

use voicegate_core::config::{LlmProviderKind, TtsProviderKind, VoiceGateConfig};
use voicegate_llm::{LlmStreamer, MockLlmStreamer, OpenAiLlmStreamer};
use voicegate_protocol::AudioFormat;
use voicegate_storage::Character;
use voicegate_tts::{DummyTtsClient, OpenAiTtsClient, TtsClient};
use voicegate_turn::OrchestratorCollaborators;

/// Builds per-character upstream collaborators from process configuration.
/// The character supplies `model`/`voice`/`system_prompt`; the config
/// supplies provider selection, credentials, and tuning knobs.
pub struct ConfiguredCollaborators {
    config: VoiceGateConfig,
}

impl ConfiguredCollaborators {
    pub fn new(config: VoiceGateConfig) -> Self {
        Self { config }
    }
}

impl OrchestratorCollaborators for ConfiguredCollaborators {
    fn llm_for(&self, character: &Character) -> Arc<dyn LlmStreamer> {
        match self.config.llm_provider {
            LlmProviderKind::Mock => Arc::new(MockLlmStreamer::new()),
            LlmProviderKind::Openai => {
                let api_key = self.config.openai_api_key.clone().unwrap_or_default();
                Arc::new(OpenAiLlmStreamer::new(
                    api_key,
                    character.model.clone(),
                    Some(character.system_prompt.clone()),
                    self.config.openai_llm_temperature,
                    self.config.openai_llm_max_tokens,
                ))
            }
        }
    }

    fn tts_for(&self, character: &Character) -> Arc<dyn TtsClient> {
        match self.config.tts_provider {
            TtsProviderKind::Dummy => Arc::new(DummyTtsClient::new(self.config.tts_sample_rate)),
            TtsProviderKind::Openai => {
                let api_key = self.config.openai_api_key.clone().unwrap_or_default();
                let format = AudioFormat::from_str(&self.config.openai_tts_format)
                    .unwrap_or(AudioFormat::Wav);
                Arc::new(OpenAiTtsClient::with_format(
                    api_key,
                    self.config.openai_tts_model.clone(),
                    character.voice.clone(),
                    format,
                ))
            }
        }
    }
}
