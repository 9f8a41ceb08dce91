use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::{CandidateSelector, ProfileAnalysis, Recommendation, RecommendationEngine};
use crate::models::profile::Profile;
use crate::store::{PostingStore, ProfileStore};

/// Resolves users and postings from the stores and hands them to the engine.
/// Only lookup failures surface to callers; scoring always degrades.
pub struct RecommendationService {
    profiles: Arc<dyn ProfileStore>,
    postings: Arc<dyn PostingStore>,
    selector: CandidateSelector,
    engine: RecommendationEngine,
}

impl RecommendationService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        postings: Arc<dyn PostingStore>,
        selector: CandidateSelector,
        engine: RecommendationEngine,
    ) -> Self {
        Self {
            profiles,
            postings,
            selector,
            engine,
        }
    }

    pub async fn recommend(&self, user_id: Uuid) -> Result<Vec<Recommendation>, AppError> {
        let profile = self.profile(user_id).await?;
        let candidates = self.selector.select_candidates(user_id).await?;
        let results = self.engine.recommend(&profile, &candidates).await;

        info!(
            "Recommended {} of {} candidates for user {}",
            results.len(),
            candidates.len(),
            user_id
        );
        Ok(results)
    }

    pub async fn analyze_profile(&self, user_id: Uuid) -> Result<ProfileAnalysis, AppError> {
        let profile = self.profile(user_id).await?;
        Ok(self.engine.analyze_profile(&profile).await)
    }

    pub async fn explain(&self, user_id: Uuid, posting_id: Uuid) -> Result<Recommendation, AppError> {
        let profile = self.profile(user_id).await?;
        let posting = self
            .postings
            .find_by_id(posting_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {posting_id} not found")))?;
        Ok(self.engine.explain(&profile, &posting).await)
    }

    async fn profile(&self, user_id: Uuid) -> Result<Profile, AppError> {
        self.profiles
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
    }
}
