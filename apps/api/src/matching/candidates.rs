use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::posting::{Posting, PostingQuery, MAX_PAGE_LIMIT};
use crate::store::{InteractionStore, PostingStore, StoreError};

/// Picks the postings worth scoring for a user: the most recent active
/// postings, minus anything the user has hidden, capped for cost.
pub struct CandidateSelector {
    postings: Arc<dyn PostingStore>,
    interactions: Arc<dyn InteractionStore>,
    pool_limit: u32,
    scoring_limit: usize,
}

impl CandidateSelector {
    pub fn new(
        postings: Arc<dyn PostingStore>,
        interactions: Arc<dyn InteractionStore>,
        pool_limit: u32,
        scoring_limit: usize,
    ) -> Self {
        Self {
            postings,
            interactions,
            pool_limit: pool_limit.clamp(1, MAX_PAGE_LIMIT),
            scoring_limit,
        }
    }

    /// Hidden postings are excluded regardless of any other interaction the
    /// user has with them. A failed hidden-set read is an error, never an
    /// empty set.
    pub async fn select_candidates(&self, user_id: Uuid) -> Result<Vec<Posting>, StoreError> {
        let query = PostingQuery {
            page: 1,
            limit: self.pool_limit,
            ..Default::default()
        };
        let pool = self.postings.query_active(&query).await?.postings;
        if pool.is_empty() {
            return Ok(vec![]);
        }

        let hidden = self.interactions.hidden_posting_ids(user_id).await?;
        let pool_size = pool.len();

        let candidates: Vec<Posting> = pool
            .into_iter()
            .filter(|p| !hidden.contains(&p.id))
            .take(self.scoring_limit)
            .collect();

        debug!(
            "Selected {} of {} recent postings for user {} ({} hidden)",
            candidates.len(),
            pool_size,
            user_id,
            hidden.len()
        );
        Ok(candidates)
    }
}
