//! Application state.

use std::sync::Arc;

use gazewatch_vision::{Engine, FrameAnalyzer};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analyzer: FrameAnalyzer,
}

impl AppState {
    /// Load the vision engine described by `config`.
    ///
    /// A model that fails to load leaves the engine inert rather than
    /// failing startup; `/ready` reports it.
    pub fn new(config: ApiConfig) -> Self {
        let engine = Engine::load(&config.engine_config());
        Self::with_engine(config, Arc::new(engine))
    }

    /// State around an already built engine.
    pub fn with_engine(config: ApiConfig, engine: Arc<Engine>) -> Self {
        Self {
            config,
            analyzer: FrameAnalyzer::new(engine),
        }
    }
}
