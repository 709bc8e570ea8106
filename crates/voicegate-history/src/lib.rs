pub mod cache;
pub mod error;
pub mod memory_store;
pub mod store;
pub mod types;

pub use cache::HistoryCache;
pub use error::{HistoryError, Result};
pub use memory_store::InMemoryHistoryStore;
pub use store::HistoryStore;
pub use types::{Message, Role};
