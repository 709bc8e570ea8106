use serde::{Deserialize, Serialize};

use crate::format::AudioFormat;

/// Client → server: one utterance.
/// Wire: `{ "sessionId": "session-...", "text": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub text: String,
}

/// Server → client: exactly one of these per frame, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Token {
        text: String,
    },
    AudioChunk {
        seq: u32,
        format: AudioFormat,
        data: String,
    },
    Done {
        assistant_text: Option<String>,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn token(text: impl Into<String>) -> Self {
        ServerEvent::Token { text: text.into() }
    }

    pub fn audio_chunk(seq: u32, format: AudioFormat, data: impl Into<String>) -> Self {
        ServerEvent::AudioChunk {
            seq,
            format,
            data: data.into(),
        }
    }

    pub fn done(assistant_text: Option<String>) -> Self {
        ServerEvent::Done { assistant_text }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerEvent::Done { .. } | ServerEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_event_wire_shape() {
        let ev = ServerEvent::token("hi");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "token");
        assert_eq!(json["text"], "hi");
    }

    #[test]
    fn audio_chunk_wire_shape() {
        let ev = ServerEvent::audio_chunk(1, AudioFormat::Wav, "AAAA");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "audio_chunk");
        assert_eq!(json["seq"], 1);
        assert_eq!(json["format"], "wav");
        assert_eq!(json["data"], "AAAA");
    }

    #[test]
    fn done_with_null_assistant_text() {
        let ev = ServerEvent::done(None);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "done");
        assert!(json["assistant_text"].is_null());
    }

    #[test]
    fn client_message_parses_camel_case_session_id() {
        let raw = r#"{"sessionId": "session-abc", "text": "hi"}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.session_id, "session-abc");
        assert_eq!(msg.text, "hi");
    }
}
