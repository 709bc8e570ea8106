use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures::Stream;
use futures::StreamExt;
use tracing::instrument;

use voicegate_history::{HistoryCache, HistoryStore};
use voicegate_orchestrator::{Orchestrator, TurnEvent};
use voicegate_protocol::ServerEvent;
use voicegate_storage::StorageBackend;

use crate::error::{Result, TurnError};
use crate::factory::OrchestratorCollaborators;

/// Per-turn lifecycle wrapper: session/character resolution, orchestrator
/// construction, turn row creation, TTFT/TTAF instrumentation, and
/// finalization on every exit path.
pub struct TurnService<B: StorageBackend, H: HistoryStore, F: OrchestratorCollaborators> {
    storage: Arc<B>,
    history: Arc<HistoryCache<H>>,
    collaborators: Arc<F>,
}

impl<B, H, F> TurnService<B, H, F>
where
    B: StorageBackend + 'static,
    H: HistoryStore + 'static,
    F: OrchestratorCollaborators + 'static,
{
    pub fn new(storage: Arc<B>, history: Arc<HistoryCache<H>>, collaborators: Arc<F>) -> Self {
        Self { storage, history, collaborators }
    }

    /// Resolve the session, run the turn pipeline, and return its ordered
    /// `ServerEvent` sequence. Fails before any event is produced if the
    /// session does not exist or has no character bound.
    #[instrument(skip(self, user_text), fields(session_id = %session_id))]
    pub async fn process_message(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = ServerEvent> + Send>>> {
        let Some((_session, character)) = self
            .storage
            .get_session_with_character(session_id)
            .map_err(|_| TurnError::SessionNotFound { session_id: session_id.to_string() })?
        else {
            return Err(TurnError::SessionNotFound { session_id: session_id.to_string() });
        };

        let Some(character) = character else {
            return Err(TurnError::CharacterNotBound { session_id: session_id.to_string() });
        };

        let _ = self.storage.update_session_last_seen(session_id);

        let llm = self.collaborators.llm_for(&character);
        let tts = self.collaborators.tts_for(&character);
        let orchestrator = Orchestrator::new(self.history.clone(), llm, tts);

        let turn_id = self
            .storage
            .create_turn(session_id, user_text)
            .map_err(|_| TurnError::SessionNotFound { session_id: session_id.to_string() })?;

        let storage = self.storage.clone();
        let session_id = session_id.to_string();
        let user_text = user_text.to_string();

        let output = stream! {
            let t0 = Instant::now();
            let mut ttft_written = false;
            let mut ttaf_written = false;
            let mut partial_text = String::new();

            let mut events = Box::pin(orchestrator.run(session_id, user_text).await);

            while let Some(item) = events.next().await {
                match item {
                    Ok(TurnEvent::Token { text }) => {
                        if !ttft_written {
                            let _ = storage.set_ttft(turn_id, t0.elapsed().as_millis() as i64);
                            ttft_written = true;
                        }
                        partial_text.push_str(&text);
                        yield ServerEvent::token(text);
                    }
                    Ok(TurnEvent::AudioChunk { seq, format, data }) => {
                        if !ttaf_written {
                            let _ = storage.set_ttaf(turn_id, t0.elapsed().as_millis() as i64);
                            ttaf_written = true;
                        }
                        yield ServerEvent::audio_chunk(seq, format, data);
                    }
                    Ok(TurnEvent::Done { assistant_text: text }) => {
                        let _ = storage.finalize_turn(turn_id, text.as_deref());
                        yield ServerEvent::done(text);
                    }
                    Err(err) => {
                        let trimmed = partial_text.trim();
                        let partial = if trimmed.is_empty() { None } else { Some(trimmed) };
                        let _ = storage.finalize_turn(turn_id, partial);
                        yield ServerEvent::error(err.to_string());
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(output))
    }
}
