//! Ingestion coordinator. Runs every registered source and upserts the
//! normalized postings by natural key.
//!
//! Sources are isolated from each other: a failing source produces a result
//! with an error and zero counts, and never stops its siblings.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::models::posting::NormalizedPosting;
use crate::store::{PostingStore, UpsertOutcome};

use super::Source;

/// Outcome of one source within an ingestion run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub source: String,
    pub jobs_scraped: usize,
    pub jobs_added: usize,
    pub jobs_updated: usize,
    /// Postings the store rejected; the rest of the batch still went through.
    pub jobs_failed: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ScrapeResult {
    fn started(source: &str) -> Self {
        let now = Utc::now();
        Self {
            source: source.to_string(),
            jobs_scraped: 0,
            jobs_added: 0,
            jobs_updated: 0,
            jobs_failed: 0,
            errors: vec![],
            started_at: now,
            completed_at: now,
        }
    }

    fn failed(mut self, message: String) -> Self {
        self.errors.push(message);
        self.completed_at = Utc::now();
        self
    }
}

/// Counts from a bulk upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub added: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Upserts each posting by natural key. A posting the store rejects is logged
/// and counted, and the batch continues.
pub async fn bulk_upsert(store: &dyn PostingStore, postings: &[NormalizedPosting]) -> UpsertSummary {
    let mut summary = UpsertSummary::default();

    for posting in postings {
        match store.upsert_by_natural_key(posting).await {
            Ok(UpsertOutcome::Inserted(_)) => summary.added += 1,
            Ok(UpsertOutcome::Updated(_)) => summary.updated += 1,
            Err(e) => {
                warn!(
                    "Failed to persist posting {}/{}: {e}",
                    posting.source, posting.source_id
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

async fn run_source(source: &dyn Source, store: &dyn PostingStore) -> ScrapeResult {
    let mut result = ScrapeResult::started(source.name());

    let postings = match source.scrape().await {
        Ok(postings) => postings,
        Err(e) => {
            warn!("{} scrape failed: {e}", source.name());
            return result.failed(e.to_string());
        }
    };

    let fetched = postings.len();
    let postings: Vec<NormalizedPosting> = postings
        .into_iter()
        .filter(NormalizedPosting::is_valid)
        .collect();
    if postings.len() < fetched {
        debug!(
            "{}: dropped {} postings without title or company",
            source.name(),
            fetched - postings.len()
        );
    }
    result.jobs_scraped = postings.len();

    let summary = bulk_upsert(store, &postings).await;
    result.jobs_added = summary.added;
    result.jobs_updated = summary.updated;
    result.jobs_failed = summary.failed;
    if summary.failed > 0 {
        result
            .errors
            .push(format!("{} postings failed to persist", summary.failed));
    }
    result.completed_at = Utc::now();

    info!(
        "{}: scraped {}, added {}, updated {}, failed {}",
        result.source, result.jobs_scraped, result.jobs_added, result.jobs_updated, result.jobs_failed
    );

    result
}

pub struct IngestionCoordinator {
    sources: Vec<Arc<dyn Source>>,
    store: Arc<dyn PostingStore>,
    parallel: bool,
    /// Held for the duration of a run so scheduled and manual runs never overlap.
    run_lock: Mutex<()>,
}

impl IngestionCoordinator {
    pub fn new(store: Arc<dyn PostingStore>, parallel: bool) -> Self {
        Self {
            sources: vec![],
            store,
            parallel,
            run_lock: Mutex::new(()),
        }
    }

    pub fn register(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Runs every source and returns one result per source, in registration order.
    pub async fn run_all(&self) -> Vec<ScrapeResult> {
        let _guard = self.run_lock.lock().await;
        info!(
            "Starting ingestion across {} sources (parallel={})",
            self.sources.len(),
            self.parallel
        );

        if !self.parallel {
            let mut results = Vec::with_capacity(self.sources.len());
            for source in &self.sources {
                results.push(run_source(source.as_ref(), self.store.as_ref()).await);
            }
            return results;
        }

        // Dropping the set aborts every task, so a cancelled run never
        // outlives the lock it holds.
        let mut tasks = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let store = Arc::clone(&self.store);
            tasks.spawn(async move { (index, run_source(source.as_ref(), store.as_ref()).await) });
        }

        let mut slots: Vec<Option<ScrapeResult>> = vec![None; self.sources.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Ingestion task aborted: {e}"),
            }
        }

        slots
            .into_iter()
            .zip(&self.sources)
            .map(|(slot, source)| {
                slot.unwrap_or_else(|| {
                    ScrapeResult::started(source.name())
                        .failed("ingestion task aborted".to_string())
                })
            })
            .collect()
    }

    /// Runs `run_all` every `every`, starting immediately. A slow run delays
    /// the next tick instead of stacking up behind it.
    pub fn spawn_poll(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let results = self.run_all().await;
                let failed = results.iter().filter(|r| !r.errors.is_empty()).count();
                info!(
                    "Scheduled ingestion finished: {} sources, {} with errors",
                    results.len(),
                    failed
                );
            }
        })
    }
}
