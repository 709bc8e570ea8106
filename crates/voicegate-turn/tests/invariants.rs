use std::sync::Arc;

use futures::StreamExt;
use proptest::prelude::*;

use voicegate_history::{HistoryCache, InMemoryHistoryStore};
use voicegate_llm::{LlmStreamer, MockLlmStreamer};
use voicegate_protocol::ServerEvent;
use voicegate_storage::{Character, SqliteStorage, StorageBackend};
use voicegate_tts::{DummyTtsClient, TtsClient};
use voicegate_turn::{OrchestratorCollaborators, TurnService};

struct EchoCollaborators;

impl OrchestratorCollaborators for EchoCollaborators {
    fn llm_for(&self, _character: &Character) -> Arc<dyn LlmStreamer> {
        Arc::new(MockLlmStreamer::new())
    }

    fn tts_for(&self, _character: &Character) -> Arc<dyn TtsClient> {
        Arc::new(DummyTtsClient::default())
    }
}

fn service_for(
    session_id: &str,
) -> TurnService<SqliteStorage, InMemoryHistoryStore, EchoCollaborators> {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    voicegate_storage::init_db(&conn).unwrap();
    conn.execute(
        "INSERT INTO characters (name, system_prompt, model, voice, created_at, updated_at)
         VALUES ('Robo', 'You are a helpful assistant.', 'mock', 'alloy', '2026-01-01', '2026-01-01')",
        [],
    )
    .unwrap();
    let character_id = conn.last_insert_rowid();
    let storage = Arc::new(SqliteStorage::new(conn));
    storage.create_session_with_character(session_id, character_id).unwrap();

    let history = Arc::new(HistoryCache::new(Arc::new(InMemoryHistoryStore::new()), 10, 86400));
    TurnService::new(storage, history, Arc::new(EchoCollaborators))
}

async fn run_turn(user_text: &str) -> (String, Option<Option<String>>, Vec<u32>, bool) {
    let service = service_for("session-prop");
    let mut stream = service.process_message("session-prop", user_text).await.unwrap();

    let mut tokens = String::new();
    let mut done_text = None;
    let mut audio_seqs = Vec::new();
    let mut saw_error = false;

    while let Some(event) = stream.next().await {
        match event {
            ServerEvent::Token { text } => tokens.push_str(&text),
            ServerEvent::AudioChunk { seq, .. } => audio_seqs.push(seq),
            ServerEvent::Done { assistant_text } => done_text = Some(assistant_text),
            ServerEvent::Error { .. } => saw_error = true,
        }
    }

    (tokens, done_text, audio_seqs, saw_error)
}

proptest! {
    /// Spec §8 invariant 1: concatenating all `token.text` values equals
    /// `done.assistant_text` (modulo trim), for any utterance, since the
    /// mock LLM deterministically echoes its input.
    #[test]
    fn token_concatenation_matches_done_text(user_text in "[a-zA-Z0-9 ]{0,40}") {
        let (tokens, done_text, _audio_seqs, saw_error) =
            tokio::runtime::Runtime::new().unwrap().block_on(run_turn(&user_text));

        prop_assert!(!saw_error, "mock path never errors");
        let done_text = done_text.expect("done event present");
        prop_assert_eq!(done_text.unwrap_or_default(), tokens.trim().to_string());
    }

    /// Spec §8 invariant 2: audio chunk `seq` values are strictly ascending.
    #[test]
    fn audio_chunk_sequence_is_strictly_ascending(user_text in "[a-zA-Z0-9 ]{0,40}") {
        let (_tokens, _done_text, audio_seqs, _saw_error) =
            tokio::runtime::Runtime::new().unwrap().block_on(run_turn(&user_text));

        for pair in audio_seqs.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}
