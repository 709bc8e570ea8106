use serde::{Deserialize, Serialize};

/// A persona configuration bound to zero or more sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub system_prompt: String,
    pub model: String,
    pub voice: String,
    pub created_at: String,
    pub updated_at: String,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// A conversational binding identified by an opaque session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub character_id: Option<i64>,
    pub created_at: String,
    pub last_seen_at: String,
}

/// One request/response exchange within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: i64,
    pub session_id: String,
    pub user_text: String,
    pub assistant_text: Option<String>,
    pub ttft_ms: Option<i64>,
    pub ttaf_ms: Option<i64>,
    pub created_at: String,
    pub completed_at: Option<String>,
}
