use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::{ProfileAnalysis, Recommendation};
use crate::models::UserIdQuery;
use crate::state::AppState;

/// GET /api/v1/ai/recommend
pub async fn handle_recommend(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let results = state.recommender.recommend(params.user_id).await?;
    Ok(Json(results))
}

/// POST /api/v1/ai/analyze-profile
pub async fn handle_analyze_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileAnalysis>, AppError> {
    let analysis = state.recommender.analyze_profile(params.user_id).await?;
    Ok(Json(analysis))
}

/// GET /api/v1/ai/explain/:id
pub async fn handle_explain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Recommendation>, AppError> {
    let explanation = state.recommender.explain(params.user_id, id).await?;
    Ok(Json(explanation))
}
