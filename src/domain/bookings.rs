//! Booking domain types
//!
//! Booking status workflow, duration/billing enums and the booking, review
//! and work proof DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Booking Status
// ============================================================================

/// Booking status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "rejected" => Some(BookingStatus::Rejected),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Duration Type
// ============================================================================

/// Billing granularity selecting which stored rate applies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DurationType {
    Hourly,
    Daily,
    Monthly,
}

impl DurationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hourly" => Some(DurationType::Hourly),
            "daily" => Some(DurationType::Daily),
            "monthly" => Some(DurationType::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationType::Hourly => "hourly",
            DurationType::Daily => "daily",
            DurationType::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for DurationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Booking Actions & Transitions
// ============================================================================

/// Workflow action applied to a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Accept,
    Reject,
    Start,
    Complete,
    Cancel,
}

impl BookingAction {
    /// Unknown action names are a caller-contract violation, rejected at the
    /// boundary before any booking state is read.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(BookingAction::Accept),
            "reject" => Some(BookingAction::Reject),
            "start" => Some(BookingAction::Start),
            "complete" => Some(BookingAction::Complete),
            "cancel" => Some(BookingAction::Cancel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Accept => "accept",
            BookingAction::Reject => "reject",
            BookingAction::Start => "start",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
        }
    }

    /// Status the booking must currently hold. `None` means the action
    /// applies from any status (cancel is deliberately unchecked).
    pub fn required_status(&self) -> Option<BookingStatus> {
        match self {
            BookingAction::Accept | BookingAction::Reject => Some(BookingStatus::Pending),
            BookingAction::Start => Some(BookingStatus::Accepted),
            BookingAction::Complete => Some(BookingStatus::InProgress),
            BookingAction::Cancel => None,
        }
    }

    pub fn target_status(&self) -> BookingStatus {
        match self {
            BookingAction::Accept => BookingStatus::Accepted,
            BookingAction::Reject => BookingStatus::Rejected,
            BookingAction::Start => BookingStatus::InProgress,
            BookingAction::Complete => BookingStatus::Completed,
            BookingAction::Cancel => BookingStatus::Cancelled,
        }
    }

    /// Only the assigned employee may drive the workflow; either party may
    /// cancel.
    pub fn employee_only(&self) -> bool {
        !matches!(self, BookingAction::Cancel)
    }
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transition precondition failure. The booking is left untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot {action} a booking that is {current}")]
pub struct TransitionError {
    pub action: BookingAction,
    pub current: BookingStatus,
}

/// Resolve the status a booking moves to when `action` is applied while it
/// holds `current`.
pub fn apply_transition(
    current: BookingStatus,
    action: BookingAction,
) -> Result<BookingStatus, TransitionError> {
    match action.required_status() {
        Some(required) if required != current => Err(TransitionError { action, current }),
        _ => Ok(action.target_status()),
    }
}

// ============================================================================
// Booking DTOs
// ============================================================================

/// Booking response
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub title: String,
    pub description: Option<String>,
    pub skill_ids: Vec<Uuid>,
    pub duration_type: String,
    pub duration_value: i32,
    pub rate_applied: Decimal,
    pub total_cost: Decimal,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create booking input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
    pub duration_type: String,
    pub duration_value: i32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Booking filter query
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookingQuery {
    #[serde(default)]
    pub status: Option<String>,
}

// ============================================================================
// Reviews
// ============================================================================

/// Review response
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create review input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

// ============================================================================
// Work Proofs
// ============================================================================

/// Work proof response
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WorkProofResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub uploaded_by: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Create work proof input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkProofRequest {
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_moves_pending_to_accepted() {
        assert_eq!(
            apply_transition(BookingStatus::Pending, BookingAction::Accept),
            Ok(BookingStatus::Accepted)
        );
    }

    #[test]
    fn reject_moves_pending_to_rejected() {
        assert_eq!(
            apply_transition(BookingStatus::Pending, BookingAction::Reject),
            Ok(BookingStatus::Rejected)
        );
    }

    #[test]
    fn start_requires_accepted() {
        assert_eq!(
            apply_transition(BookingStatus::Accepted, BookingAction::Start),
            Ok(BookingStatus::InProgress)
        );
        assert!(apply_transition(BookingStatus::Pending, BookingAction::Start).is_err());
    }

    #[test]
    fn complete_requires_in_progress() {
        assert_eq!(
            apply_transition(BookingStatus::InProgress, BookingAction::Complete),
            Ok(BookingStatus::Completed)
        );
        assert!(apply_transition(BookingStatus::Accepted, BookingAction::Complete).is_err());
    }

    #[test]
    fn accept_twice_is_rejected_and_reports_current_status() {
        let err = apply_transition(BookingStatus::Accepted, BookingAction::Accept).unwrap_err();
        assert_eq!(err.current, BookingStatus::Accepted);
        assert_eq!(err.to_string(), "cannot accept a booking that is accepted");
    }

    #[test]
    fn cancel_applies_from_any_status() {
        // Cancel carries no status precondition.
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(
                apply_transition(status, BookingAction::Cancel),
                Ok(BookingStatus::Cancelled)
            );
        }
    }

    #[test]
    fn unknown_action_does_not_parse() {
        assert_eq!(BookingAction::parse("archive"), None);
        assert_eq!(BookingAction::parse("Accept"), None);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::Rejected,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn only_cancel_is_open_to_customers() {
        assert!(BookingAction::Accept.employee_only());
        assert!(BookingAction::Reject.employee_only());
        assert!(BookingAction::Start.employee_only());
        assert!(BookingAction::Complete.employee_only());
        assert!(!BookingAction::Cancel.employee_only());
    }
}
