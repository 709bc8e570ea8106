use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::Result;
use crate::store::HistoryStore;

struct Entry {
    values: Vec<String>,
    expires_at: Option<Instant>,
}

/// In-process stand-in for a Redis-backed `HistoryStore`. Reference
/// implementation for tests and single-node deployments; a real cluster
/// deployment would plug in a Redis client behind the same trait instead.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    lists: Mutex<HashMap<String, Entry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn lpush(&self, key: &str, value: String) -> Result<()> {
        let mut lists = self.lists.lock().unwrap();
        let entry = lists.entry(key.to_string()).or_insert_with(|| Entry {
            values: Vec::new(),
            expires_at: None,
        });
        entry.values.insert(0, value);
        Ok(())
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        let mut lists = self.lists.lock().unwrap();
        if let Some(entry) = lists.get_mut(key) {
            let len = entry.values.len();
            let (lo, hi) = normalize_range(len, start, stop);
            entry.values = if lo <= hi && lo < len {
                entry.values[lo..=hi.min(len.saturating_sub(1))].to_vec()
            } else {
                Vec::new()
            };
        }
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let lists = self.lists.lock().unwrap();
        let Some(entry) = lists.get(key) else {
            return Ok(Vec::new());
        };
        if let Some(expires_at) = entry.expires_at {
            if Instant::now() >= expires_at {
                return Ok(Vec::new());
            }
        }
        let len = entry.values.len();
        let (lo, hi) = normalize_range(len, start, stop);
        if lo > hi || lo >= len {
            return Ok(Vec::new());
        }
        Ok(entry.values[lo..=hi.min(len.saturating_sub(1))].to_vec())
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()> {
        let mut lists = self.lists.lock().unwrap();
        if let Some(entry) = lists.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_seconds));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Translate Redis-style (possibly negative) list bounds into a `[lo, hi]`
/// index pair. A negative index counts from the end, `-1` being the last
/// element.
fn normalize_range(len: usize, start: isize, stop: isize) -> (usize, usize) {
    let resolve = |i: isize| -> isize {
        if i < 0 {
            (len as isize + i).max(0)
        } else {
            i
        }
    };
    let lo = resolve(start).max(0) as usize;
    let hi = resolve(stop).max(0) as usize;
    (lo, hi)
}
