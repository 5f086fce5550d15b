//! Profile routes
//!
//! Employee and customer profile management plus the public employee view.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::accounts::{
    Availability, CustomerProfileResponse, EmployeeProfileResponse, PublicEmployeeResponse, Role,
    Skill, UpsertCustomerProfileRequest, UpsertEmployeeProfileRequest,
};
use crate::error::ApiError;

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct EmployeeProfileRow {
    id: Uuid,
    user_id: Uuid,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    city: Option<String>,
    bio: Option<String>,
    hourly_rate: Decimal,
    daily_rate: Decimal,
    monthly_rate: Decimal,
    availability: String,
    experience_years: i32,
    is_verified: bool,
    avg_rating: f64,
    total_jobs: i32,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
}

const EMPLOYEE_PROFILE_SELECT: &str = r#"
    SELECT p.id, p.user_id, u.username, u.first_name, u.last_name, u.city,
           p.bio, p.hourly_rate, p.daily_rate, p.monthly_rate, p.availability,
           p.experience_years, p.is_verified, p.avg_rating, p.total_jobs,
           p.latitude, p.longitude, p.created_at
    FROM employee_profiles p
    JOIN users u ON u.id = p.user_id
    WHERE u.id = $1
"#;

/// Load one employee profile with its skill list.
async fn fetch_employee_profile(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Option<EmployeeProfileResponse>, sqlx::Error> {
    let Some(row) = sqlx::query_as::<_, EmployeeProfileRow>(EMPLOYEE_PROFILE_SELECT)
        .bind(user_id)
        .fetch_optional(db)
        .await?
    else {
        return Ok(None);
    };

    let skills = sqlx::query_as::<_, Skill>(
        r#"
        SELECT s.id, s.name, s.category, s.created_at
        FROM employee_skills es
        JOIN skills s ON s.id = es.skill_id
        WHERE es.profile_id = $1
        ORDER BY s.name
        "#,
    )
    .bind(row.id)
    .fetch_all(db)
    .await?;

    Ok(Some(EmployeeProfileResponse {
        id: row.id,
        user_id: row.user_id,
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        city: row.city,
        bio: row.bio,
        skills,
        hourly_rate: row.hourly_rate,
        daily_rate: row.daily_rate,
        monthly_rate: row.monthly_rate,
        availability: row.availability,
        experience_years: row.experience_years,
        is_verified: row.is_verified,
        avg_rating: row.avg_rating,
        total_jobs: row.total_jobs,
        latitude: row.latitude,
        longitude: row.longitude,
        created_at: row.created_at,
    }))
}

/// Replace a profile's skill set.
async fn replace_profile_skills(
    db: &PgPool,
    profile_id: Uuid,
    skill_ids: &[Uuid],
) -> Result<(), ApiError> {
    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skills WHERE id = ANY($1)")
        .bind(skill_ids)
        .fetch_one(db)
        .await?;
    if known as usize != skill_ids.len() {
        return Err(ApiError::bad_request("Unknown skill id in skill_ids"));
    }

    sqlx::query("DELETE FROM employee_skills WHERE profile_id = $1")
        .bind(profile_id)
        .execute(db)
        .await?;

    for skill_id in skill_ids {
        sqlx::query(
            "INSERT INTO employee_skills (profile_id, skill_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(profile_id)
        .bind(skill_id)
        .execute(db)
        .await?;
    }

    Ok(())
}

fn validate_availability(value: &Option<String>) -> Result<(), ApiError> {
    if let Some(a) = value {
        if Availability::parse(a).is_none() {
            return Err(ApiError::bad_request(format!(
                "Unknown availability '{}'; expected available, busy or offline",
                a
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Employee Profile
// ============================================================================

/// POST /me/employee-profile
///
/// Create the calling employee's profile.
pub async fn create_employee_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<UpsertEmployeeProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.role != Role::Employee {
        return Err(ApiError::forbidden("Only employees can create an employee profile"));
    }
    validate_availability(&input.availability)?;

    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM employee_profiles WHERE user_id = $1")
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Employee profile already exists"));
    }

    let profile_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO employee_profiles (
            id, user_id, bio, hourly_rate, daily_rate, monthly_rate,
            availability, experience_years, latitude, longitude
        ) VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, 0), COALESCE($6, 0),
                  COALESCE($7, 'available'), COALESCE($8, 0), $9, $10)
        "#,
    )
    .bind(profile_id)
    .bind(auth.user_id)
    .bind(&input.bio)
    .bind(input.hourly_rate)
    .bind(input.daily_rate)
    .bind(input.monthly_rate)
    .bind(&input.availability)
    .bind(input.experience_years)
    .bind(input.latitude)
    .bind(input.longitude)
    .execute(&state.db)
    .await?;

    if let Some(skill_ids) = &input.skill_ids {
        replace_profile_skills(&state.db, profile_id, skill_ids).await?;
    }

    let profile = fetch_employee_profile(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee profile not found"))?;

    Ok(Created(DataResponse::new(profile)))
}

/// GET /me/employee-profile
pub async fn get_my_employee_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let profile = fetch_employee_profile(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No employee profile found. Create one first."))?;

    Ok(Json(DataResponse::new(profile)))
}

/// PUT /me/employee-profile
///
/// Update the calling employee's profile. Absent fields are left unchanged.
pub async fn update_employee_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<UpsertEmployeeProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_availability(&input.availability)?;

    let profile_id: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM employee_profiles WHERE user_id = $1")
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await?;
    let profile_id =
        profile_id.ok_or_else(|| ApiError::not_found("No employee profile found. Create one first."))?;

    sqlx::query(
        r#"
        UPDATE employee_profiles SET
            bio = COALESCE($1, bio),
            hourly_rate = COALESCE($2, hourly_rate),
            daily_rate = COALESCE($3, daily_rate),
            monthly_rate = COALESCE($4, monthly_rate),
            availability = COALESCE($5, availability),
            experience_years = COALESCE($6, experience_years),
            latitude = COALESCE($7, latitude),
            longitude = COALESCE($8, longitude),
            updated_at = NOW()
        WHERE id = $9
        "#,
    )
    .bind(&input.bio)
    .bind(input.hourly_rate)
    .bind(input.daily_rate)
    .bind(input.monthly_rate)
    .bind(&input.availability)
    .bind(input.experience_years)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(profile_id)
    .execute(&state.db)
    .await?;

    if let Some(skill_ids) = &input.skill_ids {
        replace_profile_skills(&state.db, profile_id, skill_ids).await?;
    }

    let profile = fetch_employee_profile(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee profile not found"))?;

    Ok(Json(DataResponse::new(profile)))
}

/// GET /employees/:user_id
///
/// Public employee profile with completed booking count.
pub async fn get_public_employee(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let profile = fetch_employee_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let bookings_completed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE employee_id = $1 AND status = 'completed'",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DataResponse::new(PublicEmployeeResponse {
        profile,
        bookings_completed,
    })))
}

// ============================================================================
// Customer Profile
// ============================================================================

/// POST /me/customer-profile
pub async fn create_customer_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<UpsertCustomerProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.role != Role::Customer {
        return Err(ApiError::forbidden("Only customers can create a customer profile"));
    }

    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM customer_profiles WHERE user_id = $1")
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Customer profile already exists"));
    }

    let profile = sqlx::query_as::<_, CustomerProfileResponse>(
        r#"
        INSERT INTO customer_profiles (id, user_id, company_name)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, company_name, total_spent, total_bookings, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.user_id)
    .bind(&input.company_name)
    .fetch_one(&state.db)
    .await?;

    Ok(Created(DataResponse::new(profile)))
}

/// GET /me/customer-profile
pub async fn get_my_customer_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let profile = sqlx::query_as::<_, CustomerProfileResponse>(
        r#"
        SELECT id, user_id, company_name, total_spent, total_bookings, created_at
        FROM customer_profiles
        WHERE user_id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("No customer profile found. Create one first."))?;

    Ok(Json(DataResponse::new(profile)))
}

/// PUT /me/customer-profile
pub async fn update_customer_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<UpsertCustomerProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = sqlx::query_as::<_, CustomerProfileResponse>(
        r#"
        UPDATE customer_profiles SET
            company_name = COALESCE($2, company_name),
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING id, user_id, company_name, total_spent, total_bookings, created_at
        "#,
    )
    .bind(auth.user_id)
    .bind(&input.company_name)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("No customer profile found. Create one first."))?;

    Ok(Json(DataResponse::new(profile)))
}
