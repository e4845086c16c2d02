//! Application state management

use crate::inference::Predictor;

use super::ServerConfig;

/// Application state shared across handlers.
///
/// Read-only after startup; handlers only borrow the predictor.
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub predictor: Predictor,
}

impl AppState {
    pub fn new(config: ServerConfig, predictor: Predictor) -> Self {
        Self { config, predictor }
    }
}
