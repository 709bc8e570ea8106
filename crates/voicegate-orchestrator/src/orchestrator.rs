use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_stream::stream;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use voicegate_chunker::Chunker;
use voicegate_history::{HistoryCache, HistoryStore};
use voicegate_llm::{LlmEvent, LlmStreamer};
use voicegate_tts::TtsClient;

use crate::error::OrchestratorError;
use crate::event::TurnEvent;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const FRAGMENT_CHANNEL_CAPACITY: usize = 16;

type TurnItem = Result<TurnEvent, OrchestratorError>;

/// Runs the per-turn token+TTS pipeline for a character-bound set of
/// upstream collaborators. A fresh `Orchestrator` invocation is created
/// per turn by the caller; this type owns no per-character state itself.
pub struct Orchestrator<S: HistoryStore> {
    history: Arc<HistoryCache<S>>,
    llm: Arc<dyn LlmStreamer>,
    tts: Arc<dyn TtsClient>,
}

impl<S: HistoryStore + 'static> Orchestrator<S> {
    pub fn new(history: Arc<HistoryCache<S>>, llm: Arc<dyn LlmStreamer>, tts: Arc<dyn TtsClient>) -> Self {
        Self { history, llm, tts }
    }

    /// Produce the ordered event stream for one utterance. Dropping the
    /// returned stream before it completes cancels both producers and
    /// aborts any in-flight upstream call within a bounded time.
    #[instrument(skip(self, user_text), fields(session_id = %session_id))]
    pub async fn run(&self, session_id: String, user_text: String) -> TurnStream {
        let history_ctx = self.history.get_history(&session_id).await;
        self.history.append_user(&session_id, &user_text);

        let (event_tx, mut event_rx) = mpsc::channel::<TurnItem>(EVENT_CHANNEL_CAPACITY);
        let (fragment_tx, fragment_rx) = mpsc::channel::<voicegate_chunker::Fragment>(FRAGMENT_CHANNEL_CAPACITY);

        let cancel = CancellationToken::new();
        let (assistant_text_tx, assistant_text_rx) = oneshot::channel();

        let token_handle = spawn_token_producer(
            self.llm.clone(),
            user_text.clone(),
            history_ctx,
            event_tx.clone(),
            fragment_tx,
            assistant_text_tx,
            cancel.child_token(),
        );

        let tts_handle = spawn_tts_producer(
            self.tts.clone(),
            self.history.clone(),
            session_id,
            user_text,
            fragment_rx,
            assistant_text_rx,
            event_tx,
            cancel.child_token(),
        );

        let inner = stream! {
            while let Some(item) = event_rx.recv().await {
                yield item;
            }
        };

        TurnStream {
            inner: Box::pin(inner),
            _guard: CancelGuard { cancel, handles: vec![token_handle, tts_handle] },
        }
    }
}

/// Token producer: drains LLM tokens, emits `Token` events, feeds the
/// chunker, and forwards completed fragments. Flushes the chunker's tail
/// and closes the fragment channel on LLM end (success or failure).
fn spawn_token_producer(
    llm: Arc<dyn LlmStreamer>,
    user_text: String,
    history: Vec<voicegate_history::Message>,
    event_tx: mpsc::Sender<TurnItem>,
    fragment_tx: mpsc::Sender<voicegate_chunker::Fragment>,
    assistant_text_tx: oneshot::Sender<(String, Option<OrchestratorError>)>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (llm_tx, mut llm_rx) = mpsc::channel::<LlmEvent>(EVENT_CHANNEL_CAPACITY);

        let llm_task = tokio::spawn({
            let user_text = user_text.clone();
            let error_tx = llm_tx.clone();
            async move {
                // `stream` returns its own `Result` for failures raised
                // before (or instead of) any `LlmEvent` on the channel —
                // e.g. the remote streamer's 401/429/5xx/timeout/network
                // errors, which never touch `llm_tx` otherwise. Forward it
                // as a typed `LlmEvent::Error` so the drain loop below
                // still sees a terminal error instead of a silently closed
                // channel.
                if let Err(error) = llm.stream(&user_text, &history, llm_tx).await {
                    let _ = error_tx.send(LlmEvent::Error { error }).await;
                }
            }
        });

        let mut chunker = Chunker::new();
        let mut assistant_buf = String::new();
        let mut llm_error = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    llm_task.abort();
                    break;
                }
                event = llm_rx.recv() => {
                    match event {
                        Some(LlmEvent::TextDelta { text }) => {
                            assistant_buf.push_str(&text);
                            if event_tx.send(Ok(TurnEvent::Token { text: text.clone() })).await.is_err() {
                                llm_task.abort();
                                return;
                            }
                            if let Some(fragment) = chunker.push(&text) {
                                if fragment_tx.send(fragment).await.is_err() {
                                    llm_task.abort();
                                    return;
                                }
                            }
                        }
                        Some(LlmEvent::Done { .. }) | None => break,
                        Some(LlmEvent::Error { error }) => {
                            llm_error = Some(OrchestratorError::Llm(error));
                            break;
                        }
                    }
                }
            }
        }

        if let Some(fragment) = chunker.flush() {
            let _ = fragment_tx.send(fragment).await;
        }
        // fragment_tx drops here, closing the fragment channel
        let _ = assistant_text_tx.send((assistant_buf.trim().to_string(), llm_error));
    })
}

/// TTS producer: drains fragments, synthesizes audio, emits `AudioChunk`
/// events for successes and records the last failure (skip-and-continue).
/// On fragment-channel end, flushes history and emits the turn's terminal
/// event: `Done` on success, the last recorded error otherwise.
fn spawn_tts_producer<S: HistoryStore + 'static>(
    tts: Arc<dyn TtsClient>,
    history: Arc<HistoryCache<S>>,
    session_id: String,
    user_text: String,
    mut fragment_rx: mpsc::Receiver<voicegate_chunker::Fragment>,
    assistant_text_rx: oneshot::Receiver<(String, Option<OrchestratorError>)>,
    event_tx: mpsc::Sender<TurnItem>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_error: Option<OrchestratorError> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                fragment = fragment_rx.recv() => {
                    let Some(fragment) = fragment else { break };

                    match tts.synthesize(&fragment.text).await {
                        Ok(audio) => {
                            let data = BASE64.encode(&audio.data);
                            if event_tx
                                .send(Ok(TurnEvent::AudioChunk { seq: fragment.seq, format: audio.format, data }))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(err) => {
                            last_error = Some(OrchestratorError::Tts(err));
                        }
                    }
                }
            }
        }

        // The token producer always sends, even on its own failure or
        // cancellation, so this only fails if that task panicked.
        let (assistant_text, llm_error) = assistant_text_rx.await.unwrap_or_default();
        let assistant_text_opt = if assistant_text.is_empty() { None } else { Some(assistant_text.clone()) };

        history.append_assistant(&session_id, &assistant_text);
        history.flush_turn(&session_id, &user_text, &assistant_text).await;

        // An LLM failure takes priority: it means the reply itself is
        // incomplete, which matters more to the caller than a fragment
        // that failed to synthesize.
        let terminal = match llm_error.or(last_error) {
            Some(err) => Err(err),
            None => Ok(TurnEvent::Done { assistant_text: assistant_text_opt }),
        };
        let _ = event_tx.send(terminal).await;
    })
}

/// A turn's ordered event stream. Dropping it before exhaustion cancels
/// both producers and aborts their tasks.
pub struct TurnStream {
    inner: Pin<Box<dyn Stream<Item = TurnItem> + Send>>,
    _guard: CancelGuard,
}

impl Stream for TurnStream {
    type Item = TurnItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

struct CancelGuard {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        for handle in &self.handles {
            handle.abort();
        }
    }
}
