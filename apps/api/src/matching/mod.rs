// Recommendation pipeline: candidate selection, AI-assisted scoring with a
// deterministic skill-overlap fallback, and profile analysis.
// All LLM calls go through llm_client.

pub mod candidates;
pub mod engine;
pub mod fallback;
pub mod handlers;
pub mod prompts;
pub mod service;

use serde::{Deserialize, Serialize};

use crate::models::posting::Posting;

pub use candidates::CandidateSelector;
pub use engine::RecommendationEngine;
pub use service::RecommendationService;

/// Which scoring path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerBackend {
    Ai,
    Fallback,
}

/// One ranked posting for a profile. Not persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub job: Posting,
    /// 0 – 100
    pub score: u8,
    pub match_reason: String,
    pub skill_match: Vec<String>,
    /// Required skills the profile lacks. Empty on the fallback path.
    pub skill_gaps: Vec<String>,
    pub scorer_backend: ScorerBackend,
}

impl Recommendation {
    /// Zero-score explanation for a posting the scoring path did not match.
    pub fn unmatched(job: Posting, scorer_backend: ScorerBackend) -> Self {
        Self {
            job,
            score: 0,
            match_reason: "Not a match for your current profile".to_string(),
            skill_match: vec![],
            skill_gaps: vec![],
            scorer_backend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDemandItem {
    pub skill: String,
    pub demand: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAnalysis {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub market_demand: Vec<MarketDemandItem>,
}

impl ProfileAnalysis {
    /// Returned when the provider cannot be reached.
    pub fn unavailable_default() -> Self {
        Self {
            strengths: vec!["Strong technical background".to_string()],
            suggestions: vec!["Consider adding more skills to your profile".to_string()],
            market_demand: vec![
                MarketDemandItem {
                    skill: "React".to_string(),
                    demand: "high".to_string(),
                },
                MarketDemandItem {
                    skill: "Go".to_string(),
                    demand: "high".to_string(),
                },
            ],
        }
    }

    /// Returned when the provider answered with something unusable.
    pub fn unparsable_default() -> Self {
        Self {
            strengths: vec!["Diverse skill set".to_string()],
            suggestions: vec!["Keep your profile updated".to_string()],
            market_demand: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty() && self.suggestions.is_empty() && self.market_demand.is_empty()
    }
}

/// Sorts by score, highest first. Stable, so ties keep the scoring path's order.
pub fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.score.cmp(&a.score));
}
