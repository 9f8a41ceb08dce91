use axum::{extract::State, Json};
use serde::Serialize;

use crate::scraper::ScrapeResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub message: String,
    pub results: Vec<ScrapeResult>,
}

/// POST /api/v1/admin/scrape
/// Runs every registered source now. Per-source failures are reported in
/// `results`, never as an error status.
pub async fn handle_scrape(State(state): State<AppState>) -> Json<ScrapeResponse> {
    let results = state.coordinator.run_all().await;
    let total: usize = results.iter().map(|r| r.jobs_scraped).sum();
    Json(ScrapeResponse {
        message: format!("Scraped {} jobs from {} sources", total, results.len()),
        results,
    })
}
