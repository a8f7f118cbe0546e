//! Application state for notebook service.

use std::sync::Arc;

use common::config::AppConfig;
use crate::service::NotebookDumpHandler;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dump_handler: Arc<NotebookDumpHandler>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            dump_handler: Arc::new(NotebookDumpHandler::new(config.database.clone())),
            config: Arc::new(config),
        }
    }
}
