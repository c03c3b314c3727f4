//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedBackend;
use crate::config::AppConfig;
use crate::search::SearchViews;
use crate::session::SessionStore;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Cached backend (REST API or mock)
    pub backend: Arc<CachedBackend>,

    /// Server-side sessions keyed by cookie
    pub sessions: SessionStore,

    /// Per-session search page state
    pub search_views: SearchViews,

    /// Runtime configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(backend: CachedBackend, config: AppConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            sessions: SessionStore::default(),
            search_views: SearchViews::default(),
            config: Arc::new(config),
        }
    }
}
