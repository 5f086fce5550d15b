//! Admin routes
//!
//! Protected admin endpoints for the analytics dashboard and employee
//! verification. All routes require the admin role.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::dashboard::{BookingSummary, DashboardStats, FraudFlag, UnverifiedEmployee};
use crate::error::{ApiError, ErrorResponse};
use crate::services::notifications;

/// Bookings from customers crossing this cancellation/rejection count get
/// flagged on the dashboard.
const FRAUD_FLAG_THRESHOLD: i64 = 5;

// ============================================================================
// RequireAdmin Extractor
// ============================================================================

/// Extractor that requires admin privileges. Uses RequireAuth internally and
/// additionally checks the role stored on the users table.
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub auth: RequireAuth,
}

impl RequireAdmin {
    pub fn user_id(&self) -> Uuid {
        self.auth.user_id
    }
}

#[derive(Debug)]
pub enum AdminAuthError {
    NotAuthenticated,
    NotAdmin,
    DatabaseError,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AdminAuthError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required",
            ),
            AdminAuthError::NotAdmin => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Admin access only")
            }
            AdminAuthError::DatabaseError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(|_| AdminAuthError::NotAuthenticated)?;

        // The token role is advisory; the stored role decides
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|_| AdminAuthError::DatabaseError)?;

        if role.as_deref() != Some("admin") {
            tracing::warn!(user_id = %auth.user_id, "Non-admin user attempted to access admin route");
            return Err(AdminAuthError::NotAdmin);
        }

        Ok(RequireAdmin { auth })
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

/// GET /admin/stats
///
/// Platform analytics: user/booking counts, revenue, fraud indicators,
/// latest bookings and the verification queue.
pub async fn get_admin_stats(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;

    let total_employees: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'employee'")
            .fetch_one(&state.db)
            .await?;

    let total_customers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'customer'")
            .fetch_one(&state.db)
            .await?;

    let pending_verifications: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM employee_profiles WHERE is_verified = false")
            .fetch_one(&state.db)
            .await?;

    let total_bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(&state.db)
        .await?;

    let status_rows = sqlx::query_as::<_, StatusCountRow>(
        "SELECT status, COUNT(*) AS count FROM bookings GROUP BY status",
    )
    .fetch_all(&state.db)
    .await?;
    let bookings_by_status: BTreeMap<String, i64> = status_rows
        .into_iter()
        .map(|r| (r.status, r.count))
        .collect();

    let recent_bookings_30d: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE created_at >= NOW() - INTERVAL '30 days'",
    )
    .fetch_one(&state.db)
    .await?;

    let revenue: rust_decimal::Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_cost), 0) FROM bookings WHERE status = 'completed'",
    )
    .fetch_one(&state.db)
    .await?;

    // Customers racking up cancellations or rejections
    let fraud_flags = sqlx::query_as::<_, FraudFlag>(
        r#"
        SELECT u.id AS user_id, u.username,
               COUNT(*) FILTER (WHERE b.status = 'cancelled') AS cancelled,
               COUNT(*) FILTER (WHERE b.status = 'rejected') AS rejected
        FROM users u
        JOIN bookings b ON b.customer_id = u.id
        GROUP BY u.id, u.username
        HAVING COUNT(*) FILTER (WHERE b.status = 'cancelled') >= $1
            OR COUNT(*) FILTER (WHERE b.status = 'rejected') >= $1
        "#,
    )
    .bind(FRAUD_FLAG_THRESHOLD)
    .fetch_all(&state.db)
    .await?;

    let latest_bookings = sqlx::query_as::<_, BookingSummary>(
        r#"
        SELECT b.id, b.title,
               COALESCE(NULLIF(TRIM(CONCAT(cu.first_name, ' ', cu.last_name)), ''), cu.username) AS customer_name,
               COALESCE(NULLIF(TRIM(CONCAT(eu.first_name, ' ', eu.last_name)), ''), eu.username) AS employee_name,
               b.status, b.total_cost, b.created_at
        FROM bookings b
        JOIN users cu ON cu.id = b.customer_id
        JOIN users eu ON eu.id = b.employee_id
        ORDER BY b.created_at DESC
        LIMIT 20
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let unverified_employees = sqlx::query_as::<_, UnverifiedEmployee>(
        r#"
        SELECT p.id AS profile_id, p.user_id, u.username, u.first_name, u.last_name,
               p.experience_years, p.created_at
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_verified = false
        ORDER BY p.created_at
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(DashboardStats {
        total_users,
        total_employees,
        total_customers,
        pending_verifications,
        total_bookings,
        bookings_by_status,
        recent_bookings_30d,
        revenue,
        fraud_flags,
        latest_bookings,
        unverified_employees,
    })))
}

// ============================================================================
// Verification
// ============================================================================

/// POST /admin/employees/:profile_id/verify
///
/// Approve an employee's registration.
pub async fn verify_employee(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let user_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE employee_profiles
        SET is_verified = true, updated_at = NOW()
        WHERE id = $1
        RETURNING user_id
        "#,
    )
    .bind(profile_id)
    .fetch_optional(&state.db)
    .await?;

    let user_id = user_id.ok_or_else(|| ApiError::not_found("Employee profile not found"))?;

    tracing::info!(
        admin_id = %admin.user_id(),
        profile_id = %profile_id,
        user_id = %user_id,
        "Employee profile verified"
    );

    if let Err(e) = notifications::notify_employee_verified(&state.db, user_id).await {
        tracing::warn!(error = %e, user_id = %user_id, "Failed to create verification notification");
    }

    Ok(Json(MessageResponse::new("Employee verified")))
}
