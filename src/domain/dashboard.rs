//! Admin dashboard domain types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Aggregate platform statistics for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_employees: i64,
    pub total_customers: i64,
    pub pending_verifications: i64,
    pub total_bookings: i64,
    pub bookings_by_status: BTreeMap<String, i64>,
    pub recent_bookings_30d: i64,
    /// Sum of total_cost over completed bookings
    pub revenue: Decimal,
    pub fraud_flags: Vec<FraudFlag>,
    pub latest_bookings: Vec<BookingSummary>,
    pub unverified_employees: Vec<UnverifiedEmployee>,
}

/// Customer with a suspicious cancellation/rejection history
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FraudFlag {
    pub user_id: Uuid,
    pub username: String,
    pub cancelled: i64,
    pub rejected: i64,
}

/// Compact booking row for the dashboard table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookingSummary {
    pub id: Uuid,
    pub title: String,
    pub customer_name: String,
    pub employee_name: String,
    pub status: String,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Employee profile awaiting verification
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UnverifiedEmployee {
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub experience_years: i32,
    pub created_at: DateTime<Utc>,
}
