use std::sync::Arc;

use crate::config::EngineSettings;
use crate::services::{providers::MediaService, SocialGraph};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<SocialGraph>,
}

impl AppState {
    /// Creates state around a fresh social graph backed by `service`
    pub fn new(service: Arc<dyn MediaService>, settings: EngineSettings) -> Self {
        Self {
            graph: Arc::new(SocialGraph::new(service, settings)),
        }
    }
}
