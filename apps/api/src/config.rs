use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Only `DATABASE_URL` is required; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Empty key disables the AI path; every request then uses the fallback scorer.
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
    pub frontend_url: String,
    pub scrape_timeout: Duration,
    pub llm_timeout: Duration,
    pub scrape_parallel: bool,
    pub scrape_interval: Option<Duration>,
    pub candidate_pool_limit: u32,
    pub candidate_scoring_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            database_url: lookup("DATABASE_URL")
                .context("Required environment variable 'DATABASE_URL' is not set")?,
            openai_api_key: var("OPENAI_API_KEY", ""),
            openai_base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
            frontend_url: var("FRONTEND_URL", "http://localhost:5173"),
            scrape_timeout: Duration::from_secs(
                var("SCRAPE_TIMEOUT_SECS", "30")
                    .parse()
                    .context("SCRAPE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            llm_timeout: Duration::from_secs(
                var("LLM_TIMEOUT_SECS", "30")
                    .parse()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            scrape_parallel: var("SCRAPE_PARALLEL", "true")
                .parse()
                .context("SCRAPE_PARALLEL must be true or false")?,
            scrape_interval: lookup("SCRAPE_INTERVAL_SECS")
                .map(|s| s.parse::<u64>())
                .transpose()
                .context("SCRAPE_INTERVAL_SECS must be a whole number of seconds")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            candidate_pool_limit: var("CANDIDATE_POOL_LIMIT", "50")
                .parse()
                .context("CANDIDATE_POOL_LIMIT must be a positive integer")?,
            candidate_scoring_limit: var("CANDIDATE_SCORING_LIMIT", "10")
                .parse()
                .context("CANDIDATE_SCORING_LIMIT must be a positive integer")?,
        })
    }
}
