use voicegate_protocol::AudioFormat;

/// One item of a turn's ordered event sequence.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// One per LLM token, in LLM order.
    Token { text: String },
    /// One per synthesized fragment, in Chunker sequence order.
    AudioChunk { seq: u32, format: AudioFormat, data: String },
    /// Exactly one, last on the success path: the finished reply.
    Done { assistant_text: Option<String> },
}
