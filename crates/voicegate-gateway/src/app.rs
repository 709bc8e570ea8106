use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use voicegate_core::config::VoiceGateConfig;
use voicegate_history::{HistoryCache, InMemoryHistoryStore};
use voicegate_storage::SqliteStorage;
use voicegate_turn::TurnService;

use crate::collaborators::ConfiguredCollaborators;

pub type GatewayTurnService = TurnService<SqliteStorage, InMemoryHistoryStore, ConfiguredCollaborators>;

/// Central shared state, passed as `Arc<AppState>` to every Axum handler.
pub struct AppState {
    pub config: VoiceGateConfig,
    pub turns: GatewayTurnService,
}

impl AppState {
    pub fn new(config: VoiceGateConfig, storage: Arc<SqliteStorage>) -> Self {
        let history = Arc::new(HistoryCache::new(
            Arc::new(InMemoryHistoryStore::new()),
            voicegate_core::config::DEFAULT_MAX_TURNS,
            voicegate_core::config::DEFAULT_HISTORY_TTL_SECS as u64,
        ));
        let collaborators = Arc::new(ConfiguredCollaborators::new(config.clone()));
        let turns = TurnService::new(storage, history, collaborators);
        Self { config, turns }
    }
}

/// Assemble the full Axum router: one WS sink for the turn protocol, one
/// liveness probe. Character/session management is an external
/// collaborator (spec §1) and is deliberately not exposed here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::ws_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
