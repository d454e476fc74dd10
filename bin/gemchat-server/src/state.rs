//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use gemchat_core::{ChatService, MemoryStore};

use crate::config::Config;
use crate::upload::UploadDir;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Per-session conversations.
    pub store: Arc<MemoryStore>,
    /// Runs exchanges against the configured generation backend.
    pub chat: ChatService,
    /// Where uploaded files are written.
    pub uploads: UploadDir,
}

impl AppState {
    pub fn new(config: Config, chat: ChatService) -> Self {
        let store = MemoryStore::new(config.session_ttl, config.max_sessions);
        let uploads = UploadDir::new(config.upload_dir.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            chat,
            uploads,
        }
    }
}
