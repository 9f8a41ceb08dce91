//! Recommendation engine.
//!
//! Tries the completion provider first. If the call fails, times out, or the
//! reply does not parse as the expected array, the whole request is scored by
//! `fallback` instead. The two paths are never mixed within one request.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::fill_template;
use crate::llm_client::{complete_json, CompletionProvider, LlmError};
use crate::matching::prompts::{
    analyze_system, recommend_system, ANALYZE_PROMPT_TEMPLATE, DESCRIPTION_PROMPT_CHARS,
    PROFILE_BLOCK_TEMPLATE, RECOMMEND_PROMPT_TEMPLATE,
};
use crate::matching::{fallback, rank, ProfileAnalysis, Recommendation, ScorerBackend};
use crate::models::posting::Posting;
use crate::models::profile::Profile;

const RECOMMEND_TEMPERATURE: f32 = 0.3;
const ANALYZE_TEMPERATURE: f32 = 0.5;

/// One entry of the provider's ranking reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiMatch {
    job_index: i64,
    score: f64,
    #[serde(default)]
    match_reason: String,
    #[serde(default)]
    skill_match: Vec<String>,
    #[serde(default)]
    skill_gaps: Vec<String>,
}

/// Candidate as shown to the provider.
#[derive(Serialize)]
struct PromptCandidate<'a> {
    index: usize,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    salary: &'a str,
    skills: &'a [String],
    description: String,
}

pub struct RecommendationEngine {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Scores `candidates` for `profile`, highest score first.
    pub async fn recommend(&self, profile: &Profile, candidates: &[Posting]) -> Vec<Recommendation> {
        self.score(profile, candidates).await.0
    }

    /// Explains the fit of a single posting. Always returns an explanation,
    /// with a zero score from whichever path ran when it left the posting out.
    pub async fn explain(&self, profile: &Profile, posting: &Posting) -> Recommendation {
        let (results, backend) = self.score(profile, std::slice::from_ref(posting)).await;
        results
            .into_iter()
            .next()
            .unwrap_or_else(|| Recommendation::unmatched(posting.clone(), backend))
    }

    /// Runs exactly one scoring path and reports which one produced the results.
    async fn score(
        &self,
        profile: &Profile,
        candidates: &[Posting],
    ) -> (Vec<Recommendation>, ScorerBackend) {
        if candidates.is_empty() {
            return (vec![], ScorerBackend::Ai);
        }

        let (mut results, backend) = match self.recommend_with_ai(profile, candidates).await {
            Ok(results) => (results, ScorerBackend::Ai),
            Err(e) => {
                warn!(
                    "AI scoring unavailable, using skill-overlap fallback for {} candidates: {}",
                    candidates.len(),
                    e
                );
                (fallback::recommend(profile, candidates), ScorerBackend::Fallback)
            }
        };

        rank(&mut results);
        (results, backend)
    }

    pub async fn analyze_profile(&self, profile: &Profile) -> ProfileAnalysis {
        let block = profile_block(profile);
        let prompt = fill_template(ANALYZE_PROMPT_TEMPLATE, &[("profile_block", block.as_str())]);

        let result = complete_json::<ProfileAnalysis>(
            self.provider.as_ref(),
            &prompt,
            &analyze_system(),
            ANALYZE_TEMPERATURE,
            self.timeout,
        )
        .await;

        match result {
            Ok(analysis) if !analysis.is_empty() => analysis,
            Ok(_) => {
                warn!("Profile analysis reply was empty");
                ProfileAnalysis::unparsable_default()
            }
            Err(e @ (LlmError::Parse(_) | LlmError::EmptyContent)) => {
                warn!("Profile analysis reply unusable: {}", e);
                ProfileAnalysis::unparsable_default()
            }
            Err(e) => {
                warn!("Profile analysis call failed: {}", e);
                ProfileAnalysis::unavailable_default()
            }
        }
    }

    async fn recommend_with_ai(
        &self,
        profile: &Profile,
        candidates: &[Posting],
    ) -> Result<Vec<Recommendation>, LlmError> {
        let prompt = build_recommend_prompt(profile, candidates)?;
        let matches: Vec<AiMatch> = complete_json(
            self.provider.as_ref(),
            &prompt,
            &recommend_system(),
            RECOMMEND_TEMPERATURE,
            self.timeout,
        )
        .await?;

        let returned = matches.len();
        let results = collect_ai_matches(matches, candidates);
        debug!(
            "AI scoring returned {} entries, {} usable",
            returned,
            results.len()
        );
        Ok(results)
    }
}

/// Maps provider entries onto candidates. Entries pointing outside the
/// candidate range are dropped; a repeated index keeps its first entry.
fn collect_ai_matches(matches: Vec<AiMatch>, candidates: &[Posting]) -> Vec<Recommendation> {
    let mut seen = HashSet::new();

    matches
        .into_iter()
        .filter_map(|m| {
            let index = usize::try_from(m.job_index).ok()?;
            let job = candidates.get(index)?;
            if !seen.insert(index) {
                return None;
            }
            Some(Recommendation {
                job: job.clone(),
                score: clamp_score(m.score),
                match_reason: m.match_reason,
                skill_match: m.skill_match,
                skill_gaps: m.skill_gaps,
                scorer_backend: ScorerBackend::Ai,
            })
        })
        .collect()
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

fn profile_block(profile: &Profile) -> String {
    let skills_json = serde_json::to_string(&profile.skills).unwrap_or_else(|_| "[]".to_string());
    let roles_json =
        serde_json::to_string(&profile.preferred_roles).unwrap_or_else(|_| "[]".to_string());

    let salary_min = profile.salary_range.min.to_string();
    let salary_max = profile.salary_range.max.to_string();

    fill_template(
        PROFILE_BLOCK_TEMPLATE,
        &[
            ("skills_json", skills_json.as_str()),
            ("experience_level", profile.experience_level.as_str()),
            ("roles_json", roles_json.as_str()),
            ("salary_min", salary_min.as_str()),
            ("salary_max", salary_max.as_str()),
            ("remote_preference", profile.remote_preference.as_str()),
        ],
    )
}

fn build_recommend_prompt(profile: &Profile, candidates: &[Posting]) -> Result<String, LlmError> {
    let listed: Vec<PromptCandidate<'_>> = candidates
        .iter()
        .enumerate()
        .map(|(index, p)| PromptCandidate {
            index,
            title: &p.title,
            company: &p.company,
            location: &p.location,
            salary: &p.salary,
            skills: &p.skills,
            description: p.description.chars().take(DESCRIPTION_PROMPT_CHARS).collect(),
        })
        .collect();
    let jobs_json = serde_json::to_string_pretty(&listed)?;

    let profile_block = profile_block(profile);
    Ok(fill_template(
        RECOMMEND_PROMPT_TEMPLATE,
        &[
            ("profile_block", profile_block.as_str()),
            ("jobs_json", jobs_json.as_str()),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct ScriptedProvider {
        reply: Reply,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str, _system: &str, _t: f32) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(LlmError::Api {
                    status: 500,
                    message: "upstream down".to_string(),
                }),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("[]".to_string())
                }
            }
        }
    }

    fn engine(provider: Arc<ScriptedProvider>) -> RecommendationEngine {
        RecommendationEngine::new(provider, Duration::from_secs(30))
    }

    fn posting(title: &str, skills: &[&str]) -> Posting {
        Posting {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: "Acme".to_string(),
            description: "x".repeat(2000),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            salary: String::new(),
            location: "Remote".to_string(),
            source: "Remotive".to_string(),
            url: String::new(),
            source_id: title.to_string(),
            posted_at: None,
            scraped_at: Utc::now(),
            is_active: true,
        }
    }

    fn go_react_profile() -> Profile {
        Profile {
            skills: vec!["Go".to_string(), "React".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ai_results_are_ranked_and_tagged() {
        let provider = ScriptedProvider::new(Reply::Text(
            r#"```json
            [{"jobIndex": 0, "score": 40, "matchReason": "some", "skillMatch": ["Go"], "skillGaps": ["Kubernetes"]},
             {"jobIndex": 1, "score": 91.6, "matchReason": "strong", "skillMatch": ["React"], "skillGaps": []}]
            ```"#,
        ));
        let candidates = vec![posting("a", &["Go", "Kubernetes"]), posting("b", &["React"])];

        let results = engine(provider).recommend(&go_react_profile(), &candidates).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].job.title, "b");
        assert_eq!(results[0].score, 92);
        assert_eq!(results[1].skill_gaps, vec!["Kubernetes"]);
        assert!(results.iter().all(|r| r.scorer_backend == ScorerBackend::Ai));
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_entirely() {
        let candidates = vec![posting("a", &["Go", "Kubernetes"])];
        let results = engine(ScriptedProvider::new(Reply::Fail))
            .recommend(&go_react_profile(), &candidates)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 50);
        assert_eq!(results[0].skill_match, vec!["Go"]);
        assert_eq!(results[0].scorer_backend, ScorerBackend::Fallback);
    }

    #[tokio::test]
    async fn test_non_json_reply_falls_back() {
        let provider = ScriptedProvider::new(Reply::Text("Here are my thoughts on these jobs..."));
        let candidates = vec![posting("a", &["Go"]), posting("b", &["Java"])];

        let results = engine(provider).recommend(&go_react_profile(), &candidates).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job.title, "a");
        assert_eq!(results[0].score, 100);
        assert_eq!(results[0].scorer_backend, ScorerBackend::Fallback);
    }

    #[tokio::test]
    async fn test_out_of_range_and_duplicate_indices_dropped() {
        let provider = ScriptedProvider::new(Reply::Text(
            r#"[{"jobIndex": 5, "score": 99},
                {"jobIndex": -1, "score": 98},
                {"jobIndex": 0, "score": 120, "matchReason": "first"},
                {"jobIndex": 0, "score": 10, "matchReason": "second"}]"#,
        ));
        let candidates = vec![posting("a", &["Go"])];

        let results = engine(provider).recommend(&go_react_profile(), &candidates).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_reason, "first");
        assert_eq!(results[0].score, 100);
        assert_eq!(results[0].scorer_backend, ScorerBackend::Ai);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_to_fallback() {
        let candidates = vec![posting("a", &[])];
        let results = engine(ScriptedProvider::new(Reply::Hang))
            .recommend(&go_react_profile(), &candidates)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 50);
        assert_eq!(results[0].scorer_backend, ScorerBackend::Fallback);
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_provider() {
        let provider = ScriptedProvider::new(Reply::Fail);
        let results = engine(provider.clone()).recommend(&go_react_profile(), &[]).await;
        assert!(results.is_empty());
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_embeds_profile_and_truncated_candidates() {
        let provider = ScriptedProvider::new(Reply::Text("[]"));
        let candidates = vec![posting("Rust Engineer", &["Rust"])];

        engine(provider.clone()).recommend(&go_react_profile(), &candidates).await;

        let prompts = provider.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains(r#"["Go","React"]"#));
        assert!(prompt.contains("Rust Engineer"));
        assert!(prompt.contains("$50000 - $150000"));
        assert!(!prompt.contains(&"x".repeat(DESCRIPTION_PROMPT_CHARS + 1)));
    }

    #[tokio::test]
    async fn test_placeholder_text_in_profile_is_not_expanded() {
        let provider = ScriptedProvider::new(Reply::Text("[]"));
        let profile = Profile {
            skills: vec!["{jobs_json}".to_string(), "{experience_level}".to_string()],
            ..Default::default()
        };
        let candidates = vec![posting("Unique Title 7", &["Go"])];

        engine(provider.clone()).recommend(&profile, &candidates).await;

        let prompts = provider.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains(r#"["{jobs_json}","{experience_level}"]"#));
        assert_eq!(prompt.matches("Unique Title 7").count(), 1);
        assert_eq!(prompt.matches("Experience Level: mid").count(), 1);
    }

    #[tokio::test]
    async fn test_explain_returns_zero_score_when_nothing_matches() {
        let posting = posting("java", &["Java"]);
        let explanation = engine(ScriptedProvider::new(Reply::Fail))
            .explain(&go_react_profile(), &posting)
            .await;

        assert_eq!(explanation.score, 0);
        assert_eq!(explanation.job.id, posting.id);
        assert_eq!(explanation.scorer_backend, ScorerBackend::Fallback);
        assert!(explanation.skill_match.is_empty());
    }

    #[tokio::test]
    async fn test_explain_keeps_ai_verdict_when_posting_left_out() {
        let posting = posting("go", &["Go"]);
        let explanation = engine(ScriptedProvider::new(Reply::Text("[]")))
            .explain(&go_react_profile(), &posting)
            .await;

        assert_eq!(explanation.score, 0);
        assert_eq!(explanation.job.id, posting.id);
        assert_eq!(explanation.scorer_backend, ScorerBackend::Ai);
        assert!(explanation.skill_match.is_empty());
    }

    #[tokio::test]
    async fn test_explain_uses_fallback_score_when_ai_fails() {
        let posting = posting("go", &["Go", "Kubernetes"]);
        let explanation = engine(ScriptedProvider::new(Reply::Fail))
            .explain(&go_react_profile(), &posting)
            .await;

        assert_eq!(explanation.score, 50);
        assert_eq!(explanation.scorer_backend, ScorerBackend::Fallback);
    }

    #[tokio::test]
    async fn test_analyze_profile_defaults() {
        let profile = go_react_profile();

        let unavailable = engine(ScriptedProvider::new(Reply::Fail))
            .analyze_profile(&profile)
            .await;
        assert_eq!(unavailable, ProfileAnalysis::unavailable_default());

        let unparsable = engine(ScriptedProvider::new(Reply::Text("not json")))
            .analyze_profile(&profile)
            .await;
        assert_eq!(unparsable, ProfileAnalysis::unparsable_default());

        let empty = engine(ScriptedProvider::new(Reply::Text("{}")))
            .analyze_profile(&profile)
            .await;
        assert_eq!(empty, ProfileAnalysis::unparsable_default());
    }

    #[tokio::test]
    async fn test_analyze_profile_passes_through_reply() {
        let provider = ScriptedProvider::new(Reply::Text(
            r#"{"strengths": ["Go"], "suggestions": ["Learn Kubernetes"],
                "marketDemand": [{"skill": "Go", "demand": "high"}]}"#,
        ));
        let analysis = engine(provider).analyze_profile(&go_react_profile()).await;

        assert_eq!(analysis.strengths, vec!["Go"]);
        assert_eq!(analysis.market_demand[0].demand, "high");
    }
}
