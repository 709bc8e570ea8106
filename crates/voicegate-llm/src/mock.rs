use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use voicegate_history::Message;

use crate::error::Result;
use crate::provider::LlmStreamer;
use crate::stream::LlmEvent;

/// Deterministic `LlmStreamer` for local development and tests: echoes the
/// user's text back character by character with a small per-character
/// delay, so callers can exercise incremental-delivery code paths without
/// a real model behind them.
pub struct MockLlmStreamer {
    delay_per_char: Duration,
}

impl Default for MockLlmStreamer {
    fn default() -> Self {
        Self { delay_per_char: Duration::from_millis(20) }
    }
}

impl MockLlmStreamer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LlmStreamer for MockLlmStreamer {
    async fn stream(&self, user_text: &str, _history: &[Message], tx: mpsc::Sender<LlmEvent>) -> Result<()> {
        let reply = format!("echo: {user_text}");
        let mut tokens_out = 0u32;
        for ch in reply.chars() {
            sleep(self.delay_per_char).await;
            tokens_out += 1;
            if tx
                .send(LlmEvent::TextDelta { text: ch.to_string() })
                .await
                .is_err()
            {
                return Ok(()); // receiver dropped, turn cancelled
            }
        }
        let _ = tx.send(LlmEvent::Done { tokens_out }).await;
        Ok(())
    }
}
