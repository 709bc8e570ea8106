pub mod db;
pub mod error;
pub mod repo;
pub mod sqlite;
pub mod types;

pub use db::init_db;
pub use error::{Result, StorageError};
pub use repo::StorageBackend;
pub use sqlite::SqliteStorage;
pub use types::{Character, Session, Turn, DEFAULT_SYSTEM_PROMPT};
