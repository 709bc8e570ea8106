use std::io::Cursor;

use async_trait::async_trait;

use voicegate_protocol::AudioFormat;

use crate::client::{Synthesized, TtsClient};
use crate::error::Result;

const TONE_HZ: f64 = 440.0;
const MS_PER_CHAR: u64 = 35;
const MIN_MS: u64 = 180;
const MAX_MS: u64 = 1600;
const VOLUME: f64 = 0.25;

/// Deterministic `TtsClient` for local development and tests: renders a
/// sine-wave tone whose duration scales with the input text's length, as
/// a mono 16-bit PCM WAV. Gives callers something that "sounds like" a
/// chunk is arriving without depending on a real voice backend.
pub struct DummyTtsClient {
    sample_rate: u32,
}

impl DummyTtsClient {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for DummyTtsClient {
    fn default() -> Self {
        Self::new(24_000)
    }
}

#[async_trait]
impl TtsClient for DummyTtsClient {
    async fn synthesize(&self, text: &str) -> Result<Synthesized> {
        let dur_ms = (text.len() as u64 * MS_PER_CHAR).clamp(MIN_MS, MAX_MS);
        let data = render_tone(self.sample_rate, dur_ms);
        Ok(Synthesized { format: AudioFormat::Wav, data })
    }
}

fn render_tone(sample_rate: u32, dur_ms: u64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let n_frames = (dur_ms as f64 / 1000.0 * sample_rate as f64) as u64;
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut buf, spec).expect("valid wav spec");
        for i in 0..n_frames {
            let t = i as f64 / sample_rate as f64;
            let sample = VOLUME * (2.0 * std::f64::consts::PI * TONE_HZ * t).sin();
            let pcm = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
            writer.write_sample(pcm).expect("write to in-memory buffer");
        }
        writer.finalize().expect("finalize in-memory wav");
    }
    buf.into_inner()
}
