pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::analytics::AnalyticsEngine;
use crate::config::Config;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AnalyticsEngine>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<AnalyticsEngine>, config: Arc<Config>) -> Self {
        Self {
            engine,
            config,
            started_at: Instant::now(),
        }
    }

    /// Build the engine from `config` and wrap both
    pub fn from_config(config: Config) -> crate::error::Result<Self> {
        let engine = AnalyticsEngine::new(config.analytics.clone())?;
        Ok(Self::new(Arc::new(engine), Arc::new(config)))
    }
}
