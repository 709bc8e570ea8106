use crate::error::Result;
use crate::types::{Character, Session, Turn};

/// The repository operations consumed by the turn pipeline core.
///
/// All operations are transactional per call. The storage engine itself —
/// Postgres, SQLite, whatever backs a real deployment — is an external
/// collaborator; this trait is the seam the core depends on instead of a
/// concrete database client.
pub trait StorageBackend: Send + Sync {
    /// Create a session row if it doesn't exist; otherwise a no-op.
    fn upsert_session(&self, session_id: &str) -> Result<()>;

    /// Create a session already bound to a character.
    fn create_session_with_character(&self, session_id: &str, character_id: i64) -> Result<()>;

    /// Fetch a session and its bound character, if any.
    /// Returns `Ok(None)` when the session does not exist at all.
    fn get_session_with_character(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, Option<Character>)>>;

    /// Bump `last_seen_at` to now.
    fn update_session_last_seen(&self, session_id: &str) -> Result<()>;

    /// Insert a new turn row, returning its id.
    fn create_turn(&self, session_id: &str, user_text: &str) -> Result<i64>;

    /// Record time-to-first-token. Idempotent at the storage layer: a
    /// second call for the same turn is a no-op, not an error.
    fn set_ttft(&self, turn_id: i64, ms: i64) -> Result<()>;

    /// Record time-to-first-audio. Idempotent, see `set_ttft`.
    fn set_ttaf(&self, turn_id: i64, ms: i64) -> Result<()>;

    /// Finalize a turn: write `assistant_text` (possibly null) and
    /// `completed_at = now`. Called exactly once per turn by the caller,
    /// but must tolerate being called on an already-finalized turn.
    fn finalize_turn(&self, turn_id: i64, assistant_text: Option<&str>) -> Result<()>;

    /// Character CRUD lives outside the core; only reads are consumed here.
    fn get_character(&self, character_id: i64) -> Result<Option<Character>>;
}
