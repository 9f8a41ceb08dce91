pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::matching::handlers as ai;
use crate::profiles::handlers as profiles;
use crate::scraper::handlers as scraper;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/sources", get(jobs::handle_list_sources))
        .route("/api/v1/jobs/saved", get(jobs::handle_saved_jobs))
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        .route(
            "/api/v1/jobs/:id/save",
            post(jobs::handle_save_job).delete(jobs::handle_unsave_job),
        )
        .route("/api/v1/jobs/:id/hide", post(jobs::handle_hide_job))
        .route("/api/v1/jobs/:id/apply", post(jobs::handle_apply_job))
        .route("/api/v1/interactions", get(jobs::handle_list_interactions))
        // Profile
        .route(
            "/api/v1/profile",
            get(profiles::handle_get_profile).put(profiles::handle_update_profile),
        )
        // AI
        .route("/api/v1/ai/recommend", get(ai::handle_recommend))
        .route("/api/v1/ai/analyze-profile", post(ai::handle_analyze_profile))
        .route("/api/v1/ai/explain/:id", get(ai::handle_explain))
        // Admin
        .route("/api/v1/admin/scrape", post(scraper::handle_scrape))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::llm_client::{CompletionProvider, LlmError};
    use crate::matching::{CandidateSelector, RecommendationEngine, RecommendationService};
    use crate::models::posting::NormalizedPosting;
    use crate::scraper::{FetchError, IngestionCoordinator, Source};
    use crate::store::InMemoryStore;

    struct Offline;

    #[async_trait]
    impl CompletionProvider for Offline {
        async fn complete(&self, _: &str, _: &str, _: f32) -> Result<String, LlmError> {
            Err(LlmError::MissingApiKey)
        }
    }

    struct FixedSource;

    #[async_trait]
    impl Source for FixedSource {
        fn name(&self) -> &'static str {
            "Remotive"
        }

        async fn scrape(&self) -> Result<Vec<NormalizedPosting>, FetchError> {
            Ok(["go", "java"]
                .iter()
                .map(|skill| NormalizedPosting {
                    title: format!("{skill} developer"),
                    company: "Acme".to_string(),
                    description: String::new(),
                    skills: vec![skill.to_string()],
                    salary: String::new(),
                    location: "Worldwide".to_string(),
                    source: "Remotive".to_string(),
                    url: format!("https://example.com/{skill}"),
                    source_id: skill.to_string(),
                    posted_at: None,
                    is_active: true,
                })
                .collect())
        }
    }

    fn app() -> Router {
        let store = Arc::new(InMemoryStore::new());

        let coordinator = IngestionCoordinator::new(store.clone(), false)
            .register(Arc::new(FixedSource));
        let recommender = RecommendationService::new(
            store.clone(),
            store.clone(),
            CandidateSelector::new(store.clone(), store.clone(), 50, 10),
            RecommendationEngine::new(Arc::new(Offline), Duration::from_secs(5)),
        );

        build_router(AppState {
            postings: store.clone(),
            interactions: store.clone(),
            profiles: store,
            coordinator: Arc::new(coordinator),
            recommender: Arc::new(recommender),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(b) => request.body(Body::from(b.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn scraped_job_id(app: &Router, skill: &str) -> String {
        let (_, page) = send(app, "GET", &format!("/api/v1/jobs?skills={skill}"), None).await;
        page["jobs"][0]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_scrape_then_list() {
        let app = app();

        let (status, body) = send(&app, "POST", "/api/v1/admin/scrape", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["source"], "Remotive");
        assert_eq!(body["results"][0]["jobsAdded"], 2);

        // Re-running updates in place.
        let (_, body) = send(&app, "POST", "/api/v1/admin/scrape", None).await;
        assert_eq!(body["results"][0]["jobsUpdated"], 2);

        let (status, page) = send(&app, "GET", "/api/v1/jobs?limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 2);
        assert_eq!(page["totalPages"], 2);
        assert_eq!(page["jobs"].as_array().unwrap().len(), 1);

        let (_, sources) = send(&app, "GET", "/api/v1/jobs/sources", None).await;
        assert_eq!(sources, json!(["Remotive"]));
    }

    #[tokio::test]
    async fn test_interaction_on_missing_job_is_not_found() {
        let uri = format!(
            "/api/v1/jobs/{}/save?user_id={}",
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let (status, body) = send(&app(), "POST", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_save_list_and_unsave() {
        let app = app();
        send(&app, "POST", "/api/v1/admin/scrape", None).await;
        let job = scraped_job_id(&app, "go").await;
        let user = Uuid::new_v4();

        let (status, record) = send(
            &app,
            "POST",
            &format!("/api/v1/jobs/{job}/save?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["action"], "saved");
        assert_eq!(record["jobId"], job.as_str());

        let (_, saved) = send(&app, "GET", &format!("/api/v1/jobs/saved?user_id={user}"), None).await;
        assert_eq!(saved[0]["id"], job.as_str());

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/jobs/{job}/save?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, saved) = send(&app, "GET", &format!("/api/v1/jobs/saved?user_id={user}"), None).await;
        assert_eq!(saved, json!([]));
    }

    #[tokio::test]
    async fn test_profile_and_recommendations() {
        let app = app();
        send(&app, "POST", "/api/v1/admin/scrape", None).await;
        let user = Uuid::new_v4();

        let (status, _) = send(&app, "GET", &format!("/api/v1/profile?user_id={user}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, profile) = send(
            &app,
            "PUT",
            &format!("/api/v1/profile?user_id={user}"),
            Some(json!({"skills": ["go", "java"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["experienceLevel"], "mid");
        assert_eq!(profile["salaryRange"]["min"], 50000);

        let java = scraped_job_id(&app, "java").await;
        send(
            &app,
            "POST",
            &format!("/api/v1/jobs/{java}/hide?user_id={user}"),
            None,
        )
        .await;

        let (status, results) =
            send(&app, "GET", &format!("/api/v1/ai/recommend?user_id={user}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let results = results.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["job"]["title"], "go developer");
        assert_eq!(results[0]["score"], 100);
        assert_eq!(results[0]["scorerBackend"], "fallback");

        let (status, explanation) = send(
            &app,
            "GET",
            &format!("/api/v1/ai/explain/{java}?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(explanation["score"], 100);
    }

    #[tokio::test]
    async fn test_invalid_profile_rejected() {
        let (status, body) = send(
            &app(),
            "PUT",
            &format!("/api/v1/profile?user_id={}", Uuid::new_v4()),
            Some(json!({"salaryRange": {"min": 10, "max": 5}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_user_id_rejected() {
        let (status, _) = send(&app(), "GET", "/api/v1/ai/recommend", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
