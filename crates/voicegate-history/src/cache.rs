use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde_json;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::store::HistoryStore;
use crate::types::Message;

fn key_for(session_id: &str) -> String {
    format!("session:{session_id}:history")
}

/// Rolling conversation history for LLM context, backed by a durable
/// keyed-list store with an in-process mirror for low-latency reads and
/// as a fallback when the store is unreachable.
///
/// `max_turns` bounds both tiers to `max_turns * 2` messages (user +
/// assistant per turn).
pub struct HistoryCache<S: HistoryStore> {
    store: Arc<S>,
    mirror: DashMap<String, Mutex<VecDeque<Message>>>,
    max_turns: usize,
    ttl_seconds: u64,
}

impl<S: HistoryStore> HistoryCache<S> {
    pub fn new(store: Arc<S>, max_turns: usize, ttl_seconds: u64) -> Self {
        Self {
            store,
            mirror: DashMap::new(),
            max_turns,
            ttl_seconds,
        }
    }

    fn mirror_push(&self, session_id: &str, message: Message) {
        let entry = self
            .mirror
            .entry(session_id.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut deque = entry.lock().unwrap();
        deque.push_back(message);
        while deque.len() > self.max_turns * 2 {
            deque.pop_front();
        }
    }

    /// Append a user message to the in-process mirror only. Persisted on
    /// `flush_turn` once the assistant's reply is known, matching a turn's
    /// atomic "user+assistant" write to the durable store.
    pub fn append_user(&self, session_id: &str, content: &str) {
        self.mirror_push(session_id, Message::user(content));
    }

    /// Append an assistant message to the in-process mirror only.
    pub fn append_assistant(&self, session_id: &str, content: &str) {
        self.mirror_push(session_id, Message::assistant(content));
    }

    /// Oldest-first context for the given session, read from the
    /// in-process mirror.
    pub fn get_history_local(&self, session_id: &str) -> Vec<Message> {
        self.mirror
            .get(session_id)
            .map(|entry| entry.lock().unwrap().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Oldest-first context for the given session. Prefers the durable
    /// store; falls back to the in-process mirror if the store is
    /// unreachable or empty.
    #[instrument(skip(self), fields(session_id))]
    pub async fn get_history(&self, session_id: &str) -> Vec<Message> {
        let key = key_for(session_id);
        match self.store.lrange(&key, 0, -1).await {
            Ok(raw) if !raw.is_empty() => {
                let messages: Vec<Message> = raw
                    .into_iter()
                    .rev()
                    .filter_map(|s| serde_json::from_str(&s).ok())
                    .collect();
                if !messages.is_empty() {
                    let entry = self
                        .mirror
                        .entry(session_id.to_string())
                        .or_insert_with(|| Mutex::new(VecDeque::new()));
                    let mut deque = entry.lock().unwrap();
                    deque.clear();
                    deque.extend(messages.iter().cloned());
                    return messages;
                }
                self.get_history_local(session_id)
            }
            Ok(_) => self.get_history_local(session_id),
            Err(err) => {
                warn!(%err, "history store unreachable, falling back to local mirror");
                self.get_history_local(session_id)
            }
        }
    }

    /// Persist a completed turn's user+assistant pair to the durable
    /// store. Best-effort: a store failure is logged and swallowed rather
    /// than failing the turn, since the in-process mirror already has the
    /// context needed to serve the next turn on this instance.
    #[instrument(skip(self, user_text, assistant_text), fields(session_id))]
    pub async fn flush_turn(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let key = key_for(session_id);
        let user_json = serde_json::to_string(&Message::user(user_text)).unwrap();
        let assistant_json = serde_json::to_string(&Message::assistant(assistant_text)).unwrap();

        let result: Result<()> = async {
            self.store.lpush(&key, user_json).await?;
            self.store.lpush(&key, assistant_json).await?;
            self.store
                .ltrim(&key, 0, (self.max_turns * 2) as isize - 1)
                .await?;
            self.store.expire(&key, self.ttl_seconds).await?;
            Ok(())
        }
        .await;

        if let Err(err) = result {
            warn!(%err, "failed to flush turn to history store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryHistoryStore;

    fn cache() -> HistoryCache<InMemoryHistoryStore> {
        HistoryCache::new(Arc::new(InMemoryHistoryStore::new()), 10, 86400)
    }

    #[tokio::test]
    async fn round_trips_a_flushed_turn_through_the_store() {
        let cache = cache();
        cache.flush_turn("s1", "hi", "hello!").await;
        let history = cache.get_history("s1").await;
        assert_eq!(history, vec![Message::user("hi"), Message::assistant("hello!")]);
    }

    #[tokio::test]
    async fn local_mirror_serves_unflushed_appends() {
        let cache = cache();
        cache.append_user("s1", "hi");
        cache.append_assistant("s1", "hello!");
        assert_eq!(
            cache.get_history_local("s1"),
            vec![Message::user("hi"), Message::assistant("hello!")]
        );
    }

    #[tokio::test]
    async fn mirror_is_bounded_to_max_turns_times_two() {
        let cache = HistoryCache::new(Arc::new(InMemoryHistoryStore::new()), 1, 86400);
        cache.append_user("s1", "a");
        cache.append_assistant("s1", "b");
        cache.append_user("s1", "c");
        cache.append_assistant("s1", "d");
        assert_eq!(
            cache.get_history_local("s1"),
            vec![Message::user("c"), Message::assistant("d")]
        );
    }
}
