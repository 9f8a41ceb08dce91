use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interaction::{Interaction, InteractionAction};
use crate::models::posting::{Posting, PostingPage, PostingQuery};
use crate::models::UserIdQuery;
use crate::scraper::parse_skill_string;
use crate::state::AppState;

/// Raw listing parameters. Signed so out-of-range values reset to defaults
/// instead of being rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsParams {
    pub search: Option<String>,
    /// Comma-separated; a posting matches if it has any of them.
    pub skills: Option<String>,
    pub source: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListJobsParams {
    pub fn into_query(self) -> PostingQuery {
        PostingQuery {
            search: self.search,
            skills: self
                .skills
                .as_deref()
                .map(parse_skill_string)
                .unwrap_or_default(),
            source: self.source,
            page: self.page.and_then(|p| u32::try_from(p).ok()).unwrap_or(1),
            limit: self.limit.and_then(|l| u32::try_from(l).ok()).unwrap_or(0),
        }
        .normalized()
    }
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<PostingPage>, AppError> {
    let query = params.into_query();
    let page = state.postings.query_active(&query).await?;
    Ok(Json(page))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Posting>, AppError> {
    Ok(Json(find_posting(&state, id).await?))
}

/// GET /api/v1/jobs/sources
pub async fn handle_list_sources(State(state): State<AppState>) -> Json<Vec<&'static str>> {
    Json(state.coordinator.source_names())
}

/// POST /api/v1/jobs/:id/save
pub async fn handle_save_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<(StatusCode, Json<Interaction>), AppError> {
    record_interaction(&state, params.user_id, id, InteractionAction::Saved).await
}

/// DELETE /api/v1/jobs/:id/save
pub async fn handle_unsave_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.interactions.remove_saved(params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:id/hide
pub async fn handle_hide_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<(StatusCode, Json<Interaction>), AppError> {
    record_interaction(&state, params.user_id, id, InteractionAction::Hidden).await
}

/// POST /api/v1/jobs/:id/apply
pub async fn handle_apply_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<(StatusCode, Json<Interaction>), AppError> {
    record_interaction(&state, params.user_id, id, InteractionAction::Applied).await
}

/// GET /api/v1/jobs/saved
pub async fn handle_saved_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Posting>>, AppError> {
    let ids: Vec<Uuid> = state
        .interactions
        .posting_ids_with_action(params.user_id, InteractionAction::Saved)
        .await?
        .into_iter()
        .collect();
    let postings = state.postings.find_by_ids(&ids).await?;
    Ok(Json(postings))
}

/// GET /api/v1/interactions
pub async fn handle_list_interactions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Interaction>>, AppError> {
    let records = state.interactions.list_for_user(params.user_id).await?;
    Ok(Json(records))
}

async fn find_posting(state: &AppState, id: Uuid) -> Result<Posting, AppError> {
    state
        .postings
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

async fn record_interaction(
    state: &AppState,
    user_id: Uuid,
    posting_id: Uuid,
    action: InteractionAction,
) -> Result<(StatusCode, Json<Interaction>), AppError> {
    find_posting(state, posting_id).await?;
    let interaction = state
        .interactions
        .record(user_id, posting_id, action)
        .await?;
    tracing::debug!(
        "User {} {} job {}",
        user_id,
        action.as_str(),
        posting_id
    );
    Ok((StatusCode::CREATED, Json(interaction)))
}
