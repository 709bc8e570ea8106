pub mod error;
pub mod factory;
pub mod service;

pub use error::{Result, TurnError};
pub use factory::OrchestratorCollaborators;
pub use service::TurnService;
