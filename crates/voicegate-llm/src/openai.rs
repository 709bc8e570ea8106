use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use voicegate_history::{Message, Role};

use crate::error::{LlmError, Result};
use crate::provider::LlmStreamer;
use crate::stream::{parse_sse_data_line, LlmEvent};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Streams assistant replies from an OpenAI-compatible chat completions
/// endpoint over SSE.
pub struct OpenAiLlmStreamer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiLlmStreamer {
    pub fn new(
        api_key: String,
        model: String,
        system_prompt: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self::with_base_url(
            api_key,
            "https://api.openai.com".to_string(),
            model,
            system_prompt,
            temperature,
            max_tokens,
        )
    }

    pub fn with_base_url(
        api_key: String,
        base_url: String,
        model: String,
        system_prompt: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client builds");
        Self {
            client,
            api_key,
            base_url,
            model,
            system_prompt,
            temperature,
            max_tokens,
        }
    }

    fn build_messages(&self, user_text: &str, history: &[Message]) -> Vec<serde_json::Value> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system_prompt }));
        }
        for m in history {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(serde_json::json!({ "role": role, "content": m.content }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": user_text }));
        messages
    }
}

#[async_trait]
impl LlmStreamer for OpenAiLlmStreamer {
    async fn stream(&self, user_text: &str, history: &[Message], tx: mpsc::Sender<LlmEvent>) -> Result<()> {
        let messages = self.build_messages(user_text, history);
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);

        debug!(model = %self.model, "sending streaming request to LLM");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
                "stream": true,
            }))
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = resp.status().as_u16();
        if status == 401 {
            return Err(LlmError::Auth);
        }
        if status == 429 {
            let retry_after_ms = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(5000);
            return Err(LlmError::RateLimit { retry_after_ms });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "LLM API error");
            return Err(LlmError::Upstream { status, message: text });
        }

        process_stream(resp, tx).await;
        Ok(())
    }
}

fn map_reqwest_err(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Network(err.to_string())
    }
}

async fn process_stream(resp: reqwest::Response, tx: mpsc::Sender<LlmEvent>) {
    let mut tokens_out: u32 = 0;
    let mut line_buf = String::new();
    let mut byte_stream = resp.bytes_stream();

    while let Some(chunk) = byte_stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(LlmEvent::Error { error: map_reqwest_err(e) }).await;
                return;
            }
        };
        let text = match std::str::from_utf8(&chunk) {
            Ok(t) => t,
            Err(_) => continue,
        };

        line_buf.push_str(text);
        let lines: Vec<&str> = line_buf.split('\n').collect();
        let (complete, remainder) = lines.split_at(lines.len() - 1);
        let remainder = remainder.first().unwrap_or(&"").to_string();

        for line in complete {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(data) = parse_sse_data_line(line) else {
                continue;
            };
            if data.trim() == "[DONE]" {
                let _ = tx.send(LlmEvent::Done { tokens_out }).await;
                return;
            }
            if let Ok(delta) = serde_json::from_str::<StreamChunk>(data) {
                for choice in &delta.choices {
                    if let Some(content) = &choice.delta.content {
                        if !content.is_empty() {
                            tokens_out += 1;
                            if tx
                                .send(LlmEvent::TextDelta { text: content.clone() })
                                .await
                                .is_err()
                            {
                                return; // receiver dropped, turn cancelled
                            }
                        }
                    }
                }
            }
        }
        line_buf = remainder;
    }

    // The connection closed before a `[DONE]` sentinel arrived. Spec §9
    // open question (ii): treat this as an upstream failure rather than
    // a successful end of stream.
    let _ = tx
        .send(LlmEvent::Error {
            error: LlmError::Upstream {
                status: 0,
                message: "connection closed before [DONE]".to_string(),
            },
        })
        .await;
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
