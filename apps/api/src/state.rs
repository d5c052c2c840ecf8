use std::sync::Arc;

use crate::config::Config;
use crate::export::AssetLoader;
use crate::layout::PageConfig;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Config,
    /// Page geometry and surface scale for PDF export.
    pub page_config: PageConfig,
    /// Resolves export assets. Shared so its cache outlives single requests.
    pub assets: Arc<AssetLoader>,
}
