//! Skill catalogue routes

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::accounts::{CreateSkillRequest, Role, Skill};
use crate::error::ApiError;

/// GET /skills
///
/// List the skill catalogue.
pub async fn list_skills(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let skills = sqlx::query_as::<_, Skill>(
        "SELECT id, name, category, created_at FROM skills ORDER BY name",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(skills)))
}

/// POST /skills
///
/// Add a skill to the catalogue. Admin only.
pub async fn create_skill(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<CreateSkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.role != Role::Admin {
        return Err(ApiError::forbidden("Only admins can manage skills"));
    }

    let name = input.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Skill name must not be empty"));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM skills WHERE name = $1)")
        .bind(name)
        .fetch_one(&state.db)
        .await?;
    if exists {
        return Err(ApiError::conflict(format!("Skill '{}' already exists", name)));
    }

    let skill = sqlx::query_as::<_, Skill>(
        r#"
        INSERT INTO skills (id, name, category)
        VALUES ($1, $2, $3)
        RETURNING id, name, category, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&input.category)
    .fetch_one(&state.db)
    .await?;

    Ok(Created(DataResponse::new(skill)))
}
