//! Booking routes
//!
//! Booking creation (cost quoted once at creation), role-scoped listing,
//! the status workflow endpoint, reviews and work proofs.
//!
//! Status transitions and their aggregate side effects run in one
//! transaction holding a row lock on the booking, so two concurrent
//! requests cannot double-apply counters or race past a precondition.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::accounts::Role;
use crate::domain::bookings::{
    apply_transition, BookingAction, BookingQuery, BookingResponse, BookingStatus,
    CreateBookingRequest, CreateReviewRequest, CreateWorkProofRequest, ReviewResponse,
    WorkProofResponse,
};
use crate::error::ApiError;
use crate::services::{notifications, pricing};

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BookingDetailRow {
    id: Uuid,
    customer_id: Uuid,
    customer_name: String,
    employee_id: Uuid,
    employee_name: String,
    title: String,
    description: Option<String>,
    skill_ids: Vec<Uuid>,
    duration_type: String,
    duration_value: i32,
    rate_applied: Decimal,
    total_cost: Decimal,
    status: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingDetailRow> for BookingResponse {
    fn from(r: BookingDetailRow) -> Self {
        Self {
            id: r.id,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            employee_id: r.employee_id,
            employee_name: r.employee_name,
            title: r.title,
            description: r.description,
            skill_ids: r.skill_ids,
            duration_type: r.duration_type,
            duration_value: r.duration_value,
            rate_applied: r.rate_applied,
            total_cost: r.total_cost,
            status: r.status,
            start_date: r.start_date,
            end_date: r.end_date,
            location: r.location,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Booking row locked during a status transition.
#[derive(Debug, sqlx::FromRow)]
struct BookingLockRow {
    customer_id: Uuid,
    employee_id: Uuid,
    title: String,
    status: String,
    total_cost: Decimal,
}

const BOOKING_DETAIL_SELECT: &str = r#"
    SELECT b.id, b.customer_id,
           COALESCE(NULLIF(TRIM(CONCAT(cu.first_name, ' ', cu.last_name)), ''), cu.username) AS customer_name,
           b.employee_id,
           COALESCE(NULLIF(TRIM(CONCAT(eu.first_name, ' ', eu.last_name)), ''), eu.username) AS employee_name,
           b.title, b.description,
           COALESCE(array_agg(bs.skill_id) FILTER (WHERE bs.skill_id IS NOT NULL), '{}') AS skill_ids,
           b.duration_type, b.duration_value, b.rate_applied, b.total_cost, b.status,
           b.start_date, b.end_date, b.location, b.created_at, b.updated_at
    FROM bookings b
    JOIN users cu ON cu.id = b.customer_id
    JOIN users eu ON eu.id = b.employee_id
    LEFT JOIN booking_skills bs ON bs.booking_id = b.id
"#;

async fn fetch_booking(db: &PgPool, booking_id: Uuid) -> Result<Option<BookingResponse>, sqlx::Error> {
    let query_str = format!(
        "{} WHERE b.id = $1 GROUP BY b.id, cu.id, eu.id",
        BOOKING_DETAIL_SELECT
    );

    let row = sqlx::query_as::<_, BookingDetailRow>(&query_str)
        .bind(booking_id)
        .fetch_optional(db)
        .await?;

    Ok(row.map(Into::into))
}

// ============================================================================
// Query Types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct BookingListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(flatten)]
    pub filter: BookingQuery,
}

// ============================================================================
// Booking Creation
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRatesRow {
    hourly_rate: Decimal,
    daily_rate: Decimal,
    monthly_rate: Decimal,
}

/// POST /employees/:user_id/bookings
///
/// Customer books an employee. The rate and total cost are quoted from the
/// employee's rate table once, here, and never recomputed.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(employee_user_id): Path<Uuid>,
    auth: RequireAuth,
    Json(input): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.role != Role::Customer {
        return Err(ApiError::forbidden("Only customers can create bookings"));
    }
    if input.title.trim().is_empty() {
        return Err(ApiError::bad_request("Booking title must not be empty"));
    }
    if input.duration_value < 1 {
        return Err(ApiError::bad_request("duration_value must be at least 1"));
    }

    let rates = sqlx::query_as::<_, EmployeeRatesRow>(
        r#"
        SELECT p.hourly_rate, p.daily_rate, p.monthly_rate
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE u.id = $1 AND u.role = 'employee'
        "#,
    )
    .bind(employee_user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let quote = pricing::calculate_booking_cost(
        &pricing::RateTable {
            hourly: rates.hourly_rate,
            daily: rates.daily_rate,
            monthly: rates.monthly_rate,
        },
        &input.duration_type,
        input.duration_value,
    );

    let booking_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, customer_id, employee_id, title, description, duration_type,
            duration_value, rate_applied, total_cost, start_date, end_date, location
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(booking_id)
    .bind(auth.user_id)
    .bind(employee_user_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.duration_type)
    .bind(input.duration_value)
    .bind(quote.rate_applied)
    .bind(quote.total_cost)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.location)
    .execute(&state.db)
    .await?;

    for skill_id in &input.skill_ids {
        sqlx::query(
            "INSERT INTO booking_skills (booking_id, skill_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(booking_id)
        .bind(skill_id)
        .execute(&state.db)
        .await?;
    }

    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    // Best-effort notification; a failure must not fail the booking
    if let Err(e) = notifications::notify_booking_requested(
        &state.db,
        employee_user_id,
        booking_id,
        &booking.title,
        &booking.customer_name,
        booking.total_cost,
    )
    .await
    {
        tracing::warn!(error = %e, booking_id = %booking_id, "Failed to create booking notification");
    }

    Ok(Created(DataResponse::new(booking)))
}

// ============================================================================
// Booking Listing & Detail
// ============================================================================

/// GET /bookings
///
/// List bookings for the calling user: customers see their own orders,
/// employees their assignments, admins everything.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingListParams>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(status) = &query.filter.status {
        if BookingStatus::parse(status).is_none() {
            return Err(ApiError::bad_request(format!("Unknown status '{}'", status)));
        }
    }

    // Role scoping: $2 filters on customer, $3 on employee, admin passes NULL
    let (customer_scope, employee_scope) = match auth.role {
        Role::Customer => (Some(auth.user_id), None),
        Role::Employee => (None, Some(auth.user_id)),
        Role::Admin => (None, None),
    };

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bookings b
        WHERE ($1::text IS NULL OR b.status = $1)
        AND ($2::uuid IS NULL OR b.customer_id = $2)
        AND ($3::uuid IS NULL OR b.employee_id = $3)
        "#,
    )
    .bind(&query.filter.status)
    .bind(customer_scope)
    .bind(employee_scope)
    .fetch_one(&state.db)
    .await?;

    let query_str = format!(
        r#"
        {}
        WHERE ($1::text IS NULL OR b.status = $1)
        AND ($2::uuid IS NULL OR b.customer_id = $2)
        AND ($3::uuid IS NULL OR b.employee_id = $3)
        GROUP BY b.id, cu.id, eu.id
        ORDER BY b.created_at DESC
        LIMIT $4 OFFSET $5
        "#,
        BOOKING_DETAIL_SELECT
    );

    let rows = sqlx::query_as::<_, BookingDetailRow>(&query_str)
        .bind(&query.filter.status)
        .bind(customer_scope)
        .bind(employee_scope)
        .bind(query.pagination.limit())
        .bind(query.pagination.offset())
        .fetch_all(&state.db)
        .await?;

    let data: Vec<BookingResponse> = rows.into_iter().map(Into::into).collect();

    Ok(Json(Paginated::new(data, &query.pagination, total as u64)))
}

/// GET /bookings/:booking_id
///
/// Booking detail, visible to its participants and admins.
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    ensure_participant(&auth, booking.customer_id, booking.employee_id)?;

    Ok(Json(DataResponse::new(booking)))
}

fn ensure_participant(
    auth: &RequireAuth,
    customer_id: Uuid,
    employee_id: Uuid,
) -> Result<(), ApiError> {
    if auth.user_id != customer_id && auth.user_id != employee_id && auth.role != Role::Admin {
        return Err(ApiError::forbidden("Not a participant of this booking"));
    }
    Ok(())
}

// ============================================================================
// Status Workflow
// ============================================================================

/// POST /bookings/:booking_id/actions/:action
///
/// Apply a workflow action (accept/reject/start/complete/cancel). The
/// permission check runs before any state is touched; a wrong current
/// status rejects with 409 and leaves the booking unchanged. Completion
/// side effects commit atomically with the status write.
pub async fn booking_action(
    State(state): State<Arc<AppState>>,
    Path((booking_id, action)): Path<(Uuid, String)>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let action = BookingAction::parse(&action)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid action '{}'", action)))?;

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, BookingLockRow>(
        r#"
        SELECT customer_id, employee_id, title, status, total_cost
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    // Permission precedes the status check
    if action.employee_only() {
        if auth.user_id != row.employee_id {
            return Err(ApiError::forbidden(format!(
                "Only the assigned employee can {} a booking",
                action
            )));
        }
    } else if auth.user_id != row.customer_id && auth.user_id != row.employee_id {
        return Err(ApiError::forbidden(
            "Only the customer or the employee can cancel a booking",
        ));
    }

    let current = BookingStatus::parse(&row.status).ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("booking {} has status '{}'", booking_id, row.status))
    })?;

    let new_status = apply_transition(current, action).map_err(|e| ApiError::conflict(e.to_string()))?;

    sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(new_status.as_str())
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

    // Completion bumps both parties' aggregates in the same transaction
    if new_status == BookingStatus::Completed {
        sqlx::query(
            "UPDATE employee_profiles SET total_jobs = total_jobs + 1, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(row.employee_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE customer_profiles
            SET total_bookings = total_bookings + 1,
                total_spent = total_spent + $2,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(row.customer_id)
        .bind(row.total_cost)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        booking_id = %booking_id,
        action = %action,
        from = %current,
        to = %new_status,
        "Booking transition applied"
    );

    // Tell the party that didn't act; best-effort
    let recipient = if auth.user_id == row.employee_id {
        row.customer_id
    } else {
        row.employee_id
    };
    if let Err(e) = notifications::notify_booking_status_changed(
        &state.db,
        recipient,
        booking_id,
        &row.title,
        new_status.as_str(),
    )
    .await
    {
        tracing::warn!(error = %e, booking_id = %booking_id, "Failed to create status notification");
    }

    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(DataResponse::new(booking)))
}

// ============================================================================
// Reviews
// ============================================================================

/// POST /bookings/:booking_id/review
///
/// Customer reviews a completed booking. At most one review per booking;
/// the employee's average rating is recomputed in the same transaction.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
    Json(input): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !(1..=5).contains(&input.rating) {
        return Err(ApiError::bad_request("rating must be between 1 and 5"));
    }

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, BookingLockRow>(
        r#"
        SELECT customer_id, employee_id, title, status, total_cost
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if auth.user_id != row.customer_id {
        return Err(ApiError::forbidden("Only the customer can review a booking"));
    }
    if row.status != BookingStatus::Completed.as_str() {
        return Err(ApiError::conflict("Only completed bookings can be reviewed"));
    }

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM reviews WHERE booking_id = $1")
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("This booking has already been reviewed"));
    }

    let review = sqlx::query_as::<_, ReviewResponse>(
        r#"
        INSERT INTO reviews (id, booking_id, reviewer_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, booking_id, reviewer_id, rating, comment, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(booking_id)
    .bind(auth.user_id)
    .bind(input.rating)
    .bind(&input.comment)
    .fetch_one(&mut *tx)
    .await?;

    // Recompute the employee's average from all their reviews. Reviews only
    // exist for completed bookings, so this is the mean over completed work.
    sqlx::query(
        r#"
        UPDATE employee_profiles
        SET avg_rating = COALESCE((
                SELECT AVG(r.rating)::float8
                FROM reviews r
                JOIN bookings b ON b.id = r.booking_id
                WHERE b.employee_id = $1
            ), 0),
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(row.employee_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if let Err(e) = notifications::notify_review_received(
        &state.db,
        row.employee_id,
        booking_id,
        &row.title,
        input.rating,
    )
    .await
    {
        tracing::warn!(error = %e, booking_id = %booking_id, "Failed to create review notification");
    }

    Ok(Created(DataResponse::new(review)))
}

/// GET /bookings/:booking_id/review
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    ensure_participant(&auth, booking.customer_id, booking.employee_id)?;

    let review = sqlx::query_as::<_, ReviewResponse>(
        r#"
        SELECT id, booking_id, reviewer_id, rating, comment, created_at
        FROM reviews
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("No review for this booking"))?;

    Ok(Json(DataResponse::new(review)))
}

// ============================================================================
// Work Proofs
// ============================================================================

/// POST /bookings/:booking_id/work-proofs
///
/// Employee records progress on an active booking.
pub async fn create_work_proof(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
    Json(input): Json<CreateWorkProofRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if input.description.trim().is_empty() {
        return Err(ApiError::bad_request("Work proof description must not be empty"));
    }

    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if auth.user_id != booking.employee_id {
        return Err(ApiError::forbidden(
            "Only the assigned employee can upload work proof",
        ));
    }
    let active = matches!(
        BookingStatus::parse(&booking.status),
        Some(BookingStatus::Accepted) | Some(BookingStatus::InProgress)
    );
    if !active {
        return Err(ApiError::conflict(
            "Work proof can only be added to active bookings",
        ));
    }

    let proof = sqlx::query_as::<_, WorkProofResponse>(
        r#"
        INSERT INTO work_proofs (id, booking_id, uploaded_by, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, booking_id, uploaded_by, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(booking_id)
    .bind(auth.user_id)
    .bind(input.description.trim())
    .fetch_one(&state.db)
    .await?;

    Ok(Created(DataResponse::new(proof)))
}

/// GET /bookings/:booking_id/work-proofs
pub async fn list_work_proofs(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    ensure_participant(&auth, booking.customer_id, booking.employee_id)?;

    let proofs = sqlx::query_as::<_, WorkProofResponse>(
        r#"
        SELECT id, booking_id, uploaded_by, description, created_at
        FROM work_proofs
        WHERE booking_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(booking_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(proofs)))
}
