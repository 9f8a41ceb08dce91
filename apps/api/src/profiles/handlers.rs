use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::models::UserIdQuery;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .find_profile(params.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Profile for user {} not found", params.user_id))
        })?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile
/// Replaces the whole profile. Omitted fields take their defaults.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, AppError> {
    validate_profile(&profile)?;
    state.profiles.save_profile(params.user_id, &profile).await?;
    Ok(Json(profile))
}

fn validate_profile(profile: &Profile) -> Result<(), AppError> {
    let range = profile.salary_range;
    if range.min < 0 || range.min > range.max {
        return Err(AppError::Validation(format!(
            "salaryRange must satisfy 0 <= min <= max (got {} - {})",
            range.min, range.max
        )));
    }
    if profile.skills.iter().any(|s| s.trim().is_empty()) {
        return Err(AppError::Validation("skills must not contain blank entries".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::SalaryRange;

    #[test]
    fn test_default_profile_is_valid() {
        assert!(validate_profile(&Profile::default()).is_ok());
    }

    #[test]
    fn test_inverted_salary_range_rejected() {
        let profile = Profile {
            salary_range: SalaryRange { min: 90000, max: 10000 },
            ..Default::default()
        };
        assert!(matches!(validate_profile(&profile), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_skill_rejected() {
        let profile = Profile {
            skills: vec!["Go".to_string(), " ".to_string()],
            ..Default::default()
        };
        assert!(validate_profile(&profile).is_err());
    }
}
