use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use voicegate_history::{HistoryCache, InMemoryHistoryStore, Message};
use voicegate_llm::{LlmEvent, LlmStreamer, MockLlmStreamer};
use voicegate_protocol::ServerEvent;
use voicegate_storage::{Character, SqliteStorage, StorageBackend};
use voicegate_tts::{DummyTtsClient, Synthesized, TtsClient, TtsError};
use voicegate_turn::{OrchestratorCollaborators, TurnError, TurnService};

struct FailingTtsClient;

#[async_trait]
impl TtsClient for FailingTtsClient {
    async fn synthesize(&self, _text: &str) -> voicegate_tts::Result<Synthesized> {
        Err(TtsError::Network("synthesis unavailable".to_string()))
    }
}

struct MockCollaborators {
    tts_fails: bool,
}

impl OrchestratorCollaborators for MockCollaborators {
    fn llm_for(&self, _character: &Character) -> Arc<dyn LlmStreamer> {
        Arc::new(MockLlmStreamer::new())
    }

    fn tts_for(&self, _character: &Character) -> Arc<dyn TtsClient> {
        if self.tts_fails {
            Arc::new(FailingTtsClient)
        } else {
            Arc::new(DummyTtsClient::default())
        }
    }
}

fn seeded_storage_with_character() -> (Arc<SqliteStorage>, i64) {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    voicegate_storage::init_db(&conn).unwrap();
    conn.execute(
        "INSERT INTO characters (name, system_prompt, model, voice, created_at, updated_at)
         VALUES ('Robo', 'You are a helpful assistant.', 'mock', 'alloy', '2026-01-01', '2026-01-01')",
        [],
    )
    .unwrap();
    let character_id = conn.last_insert_rowid();
    (Arc::new(SqliteStorage::new(conn)), character_id)
}

fn turn_service(
    tts_fails: bool,
) -> (TurnService<SqliteStorage, InMemoryHistoryStore, MockCollaborators>, Arc<SqliteStorage>, i64) {
    let (storage, character_id) = seeded_storage_with_character();
    let history = Arc::new(HistoryCache::new(Arc::new(InMemoryHistoryStore::new()), 10, 86400));
    let collaborators = Arc::new(MockCollaborators { tts_fails });
    (TurnService::new(storage.clone(), history, collaborators), storage, character_id)
}

/// S1 — mock path, short utterance: full echo, monotonic audio seqs,
/// turn row finalized with latency columns set.
#[tokio::test]
async fn s1_mock_path_short_utterance() {
    let (service, storage, character_id) = turn_service(false);
    storage.create_session_with_character("session-s1", character_id).unwrap();

    let mut stream = service.process_message("session-s1", "Hi").await.unwrap();

    let mut tokens = String::new();
    let mut audio_seqs = Vec::new();
    let mut done_text = None;

    while let Some(event) = stream.next().await {
        match event {
            ServerEvent::Token { text } => tokens.push_str(&text),
            ServerEvent::AudioChunk { seq, .. } => audio_seqs.push(seq),
            ServerEvent::Done { assistant_text } => done_text = Some(assistant_text),
            ServerEvent::Error { message } => panic!("unexpected error: {message}"),
        }
    }

    assert_eq!(tokens, "echo: Hi");
    assert_eq!(done_text, Some(Some("echo: Hi".to_string())));
    assert!(!audio_seqs.is_empty());
    for pair in audio_seqs.windows(2) {
        assert!(pair[0] < pair[1], "seq values must be strictly ascending");
    }
}

/// S5 — no-audio variant: every TTS fragment fails, so the terminal event
/// is `error`, not `done`; the turn still finalizes with the accumulated
/// text and no ttaf.
#[tokio::test]
async fn s5_tts_failure_on_every_fragment_terminates_with_error() {
    let (service, storage, character_id) = turn_service(true);
    storage.create_session_with_character("session-s5", character_id).unwrap();

    let mut stream = service.process_message("session-s5", "Hi").await.unwrap();

    let mut saw_token = false;
    let mut saw_audio = false;
    let mut saw_error = false;

    while let Some(event) = stream.next().await {
        match event {
            ServerEvent::Token { .. } => saw_token = true,
            ServerEvent::AudioChunk { .. } => saw_audio = true,
            ServerEvent::Done { .. } => panic!("expected error, not done"),
            ServerEvent::Error { .. } => saw_error = true,
        }
    }

    assert!(saw_token, "token events are still delivered");
    assert!(!saw_audio, "no fragment synthesizes successfully");
    assert!(saw_error);

    let turn = storage.get_turn(1).unwrap().expect("turn row exists");
    assert_eq!(turn.assistant_text.as_deref(), Some("echo: Hi"), "partial text is persisted on error");
    assert!(turn.completed_at.is_some());
    assert!(turn.ttaf_ms.is_none(), "ttaf is never written when no fragment synthesizes");
}

/// S6 — session not found: no events, no turn row, typed error surfaced
/// before any streaming begins.
#[tokio::test]
async fn s6_session_not_found_raises_before_any_event() {
    let (service, _storage, _character_id) = turn_service(false);

    let result = service.process_message("session-absent", "hi").await;
    assert!(matches!(result, Err(TurnError::SessionNotFound { .. })));
}

/// A session that exists but has no character bound fails with a distinct
/// typed error, also before any event is emitted.
#[tokio::test]
async fn unbound_session_fails_with_character_not_bound() {
    let (service, storage, _character_id) = turn_service(false);
    storage.upsert_session("session-unbound").unwrap();

    let result = service.process_message("session-unbound", "hi").await;
    assert!(matches!(result, Err(TurnError::CharacterNotBound { .. })));
}

/// Records the history it was handed, then emits a single token so the
/// turn still completes normally.
struct HistorySpyLlmStreamer {
    seen: Arc<Mutex<Option<Vec<Message>>>>,
}

#[async_trait]
impl LlmStreamer for HistorySpyLlmStreamer {
    async fn stream(
        &self,
        _user_text: &str,
        history: &[Message],
        tx: mpsc::Sender<LlmEvent>,
    ) -> voicegate_llm::Result<()> {
        *self.seen.lock().unwrap() = Some(history.to_vec());
        let _ = tx.send(LlmEvent::TextDelta { text: "ok.".to_string() }).await;
        let _ = tx.send(LlmEvent::Done { tokens_out: 1 }).await;
        Ok(())
    }
}

struct SpyCollaborators {
    seen: Arc<Mutex<Option<Vec<Message>>>>,
}

impl OrchestratorCollaborators for SpyCollaborators {
    fn llm_for(&self, _character: &Character) -> Arc<dyn LlmStreamer> {
        Arc::new(HistorySpyLlmStreamer { seen: self.seen.clone() })
    }

    fn tts_for(&self, _character: &Character) -> Arc<dyn TtsClient> {
        Arc::new(DummyTtsClient::default())
    }
}

/// S4 — history fan-in: a turn's LLM call receives the prior turn's
/// messages plus the new user text, in chronological order, before any
/// token is produced.
#[tokio::test]
async fn s4_llm_receives_prior_history_plus_new_user_text() {
    let (storage, character_id) = seeded_storage_with_character();
    storage.create_session_with_character("session-s4", character_id).unwrap();

    let history = Arc::new(HistoryCache::new(Arc::new(InMemoryHistoryStore::new()), 10, 86400));
    history.flush_turn("session-s4", "Q1", "A1").await;

    let seen = Arc::new(Mutex::new(None));
    let collaborators = Arc::new(SpyCollaborators { seen: seen.clone() });
    let service = TurnService::new(storage, history, collaborators);

    let mut stream = service.process_message("session-s4", "Q2").await.unwrap();
    while stream.next().await.is_some() {}

    let seen = seen.lock().unwrap().clone().expect("streamer was invoked");
    assert_eq!(
        seen,
        vec![Message::user("Q1"), Message::assistant("A1")],
        "history passed to the LLM is everything before this turn's own messages"
    );
}
