use async_trait::async_trait;

use voicegate_protocol::AudioFormat;

use crate::client::{Synthesized, TtsClient};
use crate::error::{Result, TtsError};

const SPEECH_PATH: &str = "/v1/audio/speech";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Synthesizes audio via an OpenAI-compatible text-to-speech endpoint.
///
/// Voice and response format are both fixed per instance (spec §4.3: "voice
/// is fixed per client instance"; the spec's `synthesize(text, format)`
/// signature has no other place in the data model where a caller would pick
/// a format per turn, so format is treated the same way voice is).
pub struct OpenAiTtsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
    format: AudioFormat,
}

impl OpenAiTtsClient {
    pub fn new(api_key: String, model: String, voice: String) -> Self {
        Self::with_format(api_key, model, voice, AudioFormat::Wav)
    }

    pub fn with_format(api_key: String, model: String, voice: String, format: AudioFormat) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com".to_string(), model, voice, format)
    }

    pub fn with_base_url(
        api_key: String,
        base_url: String,
        model: String,
        voice: String,
        format: AudioFormat,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client builds");
        Self { client, api_key, base_url, model, voice, format }
    }
}

#[async_trait]
impl TtsClient for OpenAiTtsClient {
    async fn synthesize(&self, text: &str) -> Result<Synthesized> {
        let url = format!("{}{}", self.base_url, SPEECH_PATH);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "input": text,
                "voice": self.voice,
                "response_format": self.format.as_str(),
            }))
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = resp.status().as_u16();
        if status == 401 {
            return Err(TtsError::Auth);
        }
        if status == 429 {
            let retry_after_ms = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(5000);
            return Err(TtsError::RateLimit { retry_after_ms });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TtsError::Upstream { status, message: text });
        }

        let data = resp.bytes().await.map_err(map_reqwest_err)?.to_vec();
        Ok(Synthesized { format: self.format, data })
    }
}

fn map_reqwest_err(err: reqwest::Error) -> TtsError {
    if err.is_timeout() {
        TtsError::Timeout
    } else {
        TtsError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> OpenAiTtsClient {
        OpenAiTtsClient::with_base_url(
            "test-key".to_string(),
            base_url,
            "tts-1".to_string(),
            "alloy".to_string(),
            AudioFormat::Wav,
        )
    }

    #[tokio::test]
    async fn synthesize_returns_response_body_as_wav() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3, 4]))
            .mount(&server)
            .await;

        let out = client(server.uri()).synthesize("hello").await.unwrap();
        assert_eq!(out.data, vec![1, 2, 3, 4]);
        assert!(matches!(out.format, AudioFormat::Wav));
    }

    #[tokio::test]
    async fn http_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(server.uri()).synthesize("hello").await.unwrap_err();
        assert!(matches!(err, TtsError::Auth));
    }

    #[tokio::test]
    async fn http_429_maps_to_rate_limit_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let err = client(server.uri()).synthesize("hello").await.unwrap_err();
        assert!(matches!(err, TtsError::RateLimit { retry_after_ms: 3000 }));
    }

    #[tokio::test]
    async fn http_500_maps_to_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(server.uri()).synthesize("hello").await.unwrap_err();
        assert!(matches!(err, TtsError::Upstream { status: 500, .. }));
    }
}
