//! Account domain types
//!
//! Roles, skills and the employee/customer profile DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Role
// ============================================================================

/// Account role. Every user is exactly one of these; handlers match on the
/// variant instead of probing for profile attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
    Customer,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Availability
// ============================================================================

/// Employee bookable state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Busy,
    Offline,
}

impl Availability {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Availability::Available),
            "busy" => Some(Availability::Busy),
            "offline" => Some(Availability::Offline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Busy => "busy",
            Availability::Offline => "offline",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Skills
// ============================================================================

/// Skill entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create skill request (admin only)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

// ============================================================================
// Employee profile
// ============================================================================

/// Employee profile response
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<Skill>,
    pub hourly_rate: Decimal,
    pub daily_rate: Decimal,
    pub monthly_rate: Decimal,
    pub availability: String,
    pub experience_years: i32,
    pub is_verified: bool,
    pub avg_rating: f64,
    pub total_jobs: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Create/update employee profile input. Absent fields keep their value.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpsertEmployeeProfileRequest {
    pub bio: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub daily_rate: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    pub availability: Option<String>,
    pub experience_years: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Replaces the full skill set when present
    pub skill_ids: Option<Vec<Uuid>>,
}

/// Public employee profile with booking history summary
#[derive(Debug, Clone, Serialize)]
pub struct PublicEmployeeResponse {
    #[serde(flatten)]
    pub profile: EmployeeProfileResponse,
    pub bookings_completed: i64,
}

// ============================================================================
// Customer profile
// ============================================================================

/// Customer profile response
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub total_spent: Decimal,
    pub total_bookings: i32,
    pub created_at: DateTime<Utc>,
}

/// Create/update customer profile input
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpsertCustomerProfileRequest {
    pub company_name: Option<String>,
}
