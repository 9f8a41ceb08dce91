use std::sync::Arc;

use crate::matching::RecommendationService;
use crate::scraper::IngestionCoordinator;
use crate::store::{InteractionStore, PostingStore, ProfileStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub postings: Arc<dyn PostingStore>,
    pub interactions: Arc<dyn InteractionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    /// Also driven by the background poll when `SCRAPE_INTERVAL_SECS` is set.
    pub coordinator: Arc<IngestionCoordinator>,
    pub recommender: Arc<RecommendationService>,
}
