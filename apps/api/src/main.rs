mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod matching;
mod models;
mod profiles;
mod routes;
mod scraper;
mod state;
mod store;

use anyhow::Result;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::{CandidateSelector, RecommendationEngine, RecommendationService};
use crate::routes::build_router;
use crate::scraper::{HttpSource, IngestionCoordinator, RemoteOk, Remotive};
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireSense API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.llm_timeout,
    )?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("OPENAI_API_KEY not set; recommendations will use skill-overlap scoring only");
    }

    // Register job sources
    let coordinator = IngestionCoordinator::new(store.clone(), config.scrape_parallel)
        .register(Arc::new(HttpSource::new(RemoteOk::new(), config.scrape_timeout)?))
        .register(Arc::new(HttpSource::new(Remotive::new(), config.scrape_timeout)?));
    let coordinator = Arc::new(coordinator);
    info!("Job sources: {:?}", coordinator.source_names());

    if let Some(every) = config.scrape_interval {
        info!("Scheduled ingestion every {:?}", every);
        coordinator.clone().spawn_poll(every);
    }

    // Recommendation pipeline
    let selector = CandidateSelector::new(
        store.clone(),
        store.clone(),
        config.candidate_pool_limit,
        config.candidate_scoring_limit,
    );
    let engine = RecommendationEngine::new(Arc::new(llm), config.llm_timeout);
    let recommender = RecommendationService::new(store.clone(), store.clone(), selector, engine);

    // Build app state
    let state = AppState {
        postings: store.clone(),
        interactions: store.clone(),
        profiles: store,
        coordinator,
        recommender: Arc::new(recommender),
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_str(&config.frontend_url)?))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
