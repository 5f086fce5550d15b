//! Matching and search routes
//!
//! Ranked employee listing (weighted match score with breakdown) and the
//! token-based smart search.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::accounts::Availability;
use crate::domain::matching::{MatchQueryParams, MatchRequest, SearchQueryParams};
use crate::error::ApiError;
use crate::services::matching;

/// GET /employees
///
/// Rank available employees by match score. Every entry carries the combined
/// score and the skill/rating/proximity breakdown.
pub async fn list_ranked_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchQueryParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let required_skills = parse_skill_ids(query.skills.as_deref())?;

    let availability = match &query.availability {
        Some(a) => {
            let parsed = Availability::parse(a).ok_or_else(|| {
                ApiError::bad_request(format!(
                    "Unknown availability '{}'; expected available, busy or offline",
                    a
                ))
            })?;
            parsed.as_str().to_string()
        }
        None => Availability::Available.as_str().to_string(),
    };

    // Both coordinates or neither; a half-specified location stays unknown
    // and scores neutral.
    let customer_location = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };

    let limit = query
        .limit
        .unwrap_or(state.settings.match_limit)
        .clamp(1, 100);

    let request = MatchRequest {
        required_skills,
        customer_location,
        availability: Some(availability),
        limit,
        max_km: state.settings.match_radius_km,
    };

    let ranked = matching::rank_employees(&state.db, &request).await?;

    Ok(Json(DataResponse::new(ranked)))
}

/// GET /employees/search?q=...
///
/// Token OR-search over skill names, bio, city and user names. Restricted to
/// available employees; an empty query matches nothing.
pub async fn search_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQueryParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let q = query.q.unwrap_or_default();
    let profiles = matching::smart_search(&state.db, &q).await?;

    Ok(Json(DataResponse::new(profiles)))
}

fn parse_skill_ids(raw: Option<&str>) -> Result<Vec<Uuid>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| ApiError::bad_request(format!("Invalid skill id '{}'", s)))
        })
        .collect()
}
