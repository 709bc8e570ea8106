use async_trait::async_trait;

use crate::error::Result;

/// The external keyed-list cache consumed for durable, cross-instance
/// conversation history. Shaped after the list primitives a Redis-like
/// store exposes, so a real deployment can swap in an actual Redis client
/// without touching the call sites.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Push `value` onto the head of the list at `key`.
    async fn lpush(&self, key: &str, value: String) -> Result<()>;

    /// Trim the list at `key` to the inclusive range `[start, stop]`.
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()>;

    /// Read the list at `key` over the inclusive range `[start, stop]`.
    /// `stop = -1` means "to the end".
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Reset the key's expiry to `ttl_seconds` from now.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()>;

    /// Liveness probe against the backing store.
    async fn ping(&self) -> Result<()>;
}
