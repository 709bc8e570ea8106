use figment::{providers::Env, Figment};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const DEFAULT_GATEWAY_PORT: u16 = 8787;
pub const DEFAULT_GATEWAY_BIND: &str = "127.0.0.1";
pub const DEFAULT_MAX_TURNS: usize = 10;
pub const DEFAULT_HISTORY_TTL_SECS: i64 = 60 * 60 * 24;

/// Top-level config, assembled from `VOICEGATE_*`/provider-prefixed env vars.
///
/// Field names mirror the environment variables named in the external
/// interfaces section verbatim (`DATABASE_URL`, `LLM_PROVIDER`, ...) so
/// `figment`'s case-insensitive `Env` provider maps them without renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceGateConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_cache_url")]
    pub cache_url: String,
    #[serde(default = "default_tts_url")]
    pub tts_url: String,

    #[serde(default)]
    pub llm_provider: LlmProviderKind,
    pub openai_api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub openai_llm_model: String,
    #[serde(default = "default_temperature")]
    pub openai_llm_temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub openai_llm_max_tokens: u32,
    #[serde(default = "default_system_prompt")]
    pub openai_llm_system_prompt: String,

    #[serde(default)]
    pub tts_provider: TtsProviderKind,
    #[serde(default = "default_tts_model")]
    pub openai_tts_model: String,
    #[serde(default = "default_tts_voice")]
    pub openai_tts_voice: String,
    #[serde(default = "default_tts_format")]
    pub openai_tts_format: String,
    #[serde(default = "default_sample_rate")]
    pub tts_sample_rate: u32,
    #[serde(default = "default_max_text_len")]
    pub tts_max_text_len: usize,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_gateway_port")]
    pub gateway_port: u16,
    #[serde(default = "default_gateway_bind")]
    pub gateway_bind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Mock,
    Openai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProviderKind {
    #[default]
    Dummy,
    Openai,
}

impl Default for VoiceGateConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            cache_url: default_cache_url(),
            tts_url: default_tts_url(),
            llm_provider: LlmProviderKind::default(),
            openai_api_key: None,
            openai_llm_model: default_llm_model(),
            openai_llm_temperature: default_temperature(),
            openai_llm_max_tokens: default_max_tokens(),
            openai_llm_system_prompt: default_system_prompt(),
            tts_provider: TtsProviderKind::default(),
            openai_tts_model: default_tts_model(),
            openai_tts_voice: default_tts_voice(),
            openai_tts_format: default_tts_format(),
            tts_sample_rate: default_sample_rate(),
            tts_max_text_len: default_max_text_len(),
            log_json: false,
            gateway_port: default_gateway_port(),
            gateway_bind: default_gateway_bind(),
        }
    }
}

impl VoiceGateConfig {
    /// Load config from the process environment, falling back to defaults
    /// for anything unset. Never reads a config file — this system is
    /// entirely environment-driven per the external interfaces contract.
    pub fn load() -> Result<Self> {
        Figment::from(figment::providers::Serialized::defaults(
            VoiceGateConfig::default(),
        ))
        .merge(Env::raw())
        .extract()
        .map_err(|e| CoreError::Config(e.to_string()))
    }
}

fn default_database_url() -> String {
    "sqlite://voicegate.db".to_string()
}
fn default_cache_url() -> String {
    "memory://".to_string()
}
fn default_tts_url() -> String {
    "http://localhost:8788".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}
fn default_tts_model() -> String {
    "tts-1".to_string()
}
fn default_tts_voice() -> String {
    "alloy".to_string()
}
fn default_tts_format() -> String {
    "wav".to_string()
}
fn default_sample_rate() -> u32 {
    24_000
}
fn default_max_text_len() -> usize {
    4096
}
fn default_gateway_port() -> u16 {
    DEFAULT_GATEWAY_PORT
}
fn default_gateway_bind() -> String {
    DEFAULT_GATEWAY_BIND.to_string()
}
