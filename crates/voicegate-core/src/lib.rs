pub mod config;
pub mod error;
pub mod logging;
pub mod session_id;

pub use config::VoiceGateConfig;
pub use error::CoreError;
