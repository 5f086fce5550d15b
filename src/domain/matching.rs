//! Matching domain types
//!
//! Request/response shapes for the ranking engine and smart search. The
//! ranking contract — (required skills, customer location, availability,
//! limit) in, scored candidates with a per-factor breakdown out — is kept
//! narrow so the weighted-sum heuristic can be swapped for a learned model
//! without touching callers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::accounts::EmployeeProfileResponse;

/// Query parameters for the ranked employee listing
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MatchQueryParams {
    /// Comma-separated skill ids
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Resolved ranking request
#[derive(Debug, Clone, Default)]
pub struct MatchRequest {
    pub required_skills: Vec<Uuid>,
    pub customer_location: Option<(f64, f64)>,
    pub availability: Option<String>,
    pub limit: usize,
    pub max_km: f64,
}

/// Per-factor sub-scores, rounded to 2 decimals for display
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScoreBreakdown {
    pub skill: f64,
    pub rating: f64,
    pub proximity: f64,
}

/// One ranked candidate
#[derive(Debug, Clone, Serialize)]
pub struct RankedEmployee {
    pub profile: EmployeeProfileResponse,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Query parameters for smart search
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchQueryParams {
    #[serde(default)]
    pub q: Option<String>,
}
