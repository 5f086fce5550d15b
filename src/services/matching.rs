//! Matching engine and smart search.
//!
//! The match score is a weighted sum of three independent 0-1 sub-scores:
//! skill overlap (50%), rating (30%) and proximity (20%). The scoring over
//! already-loaded candidates is pure; swap `score_candidates` for a trained
//! model without changing the call contract.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::accounts::{EmployeeProfileResponse, Skill};
use crate::domain::matching::{MatchRequest, RankedEmployee, ScoreBreakdown};

const SKILL_WEIGHT: f64 = 0.50;
const RATING_WEIGHT: f64 = 0.30;
const PROXIMITY_WEIGHT: f64 = 0.20;

const EARTH_RADIUS_KM: f64 = 6371.0;

// ============================================================================
// Sub-scores
// ============================================================================

/// Skill overlap score: |employee ∩ required| / |required|.
///
/// This is recall over the required set, not Jaccard: surplus employee
/// skills are irrelevant to the request and do not penalize.
pub fn skill_score(employee_skills: &HashSet<Uuid>, required_skills: &HashSet<Uuid>) -> f64 {
    if required_skills.is_empty() {
        return 1.0;
    }
    let overlap = employee_skills.intersection(required_skills).count();
    overlap as f64 / required_skills.len() as f64
}

/// 0-1 score normalised from the 0-5 star rating.
pub fn rating_score(avg_rating: f64) -> f64 {
    avg_rating / 5.0
}

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = phi2 - phi1;
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Proximity score with linear decay: 1 at the same point, 0 at or beyond
/// `max_km`. An unknown location on either side scores a neutral 0.5.
pub fn proximity_score(
    customer: Option<(f64, f64)>,
    employee_lat: Option<f64>,
    employee_lng: Option<f64>,
    max_km: f64,
) -> f64 {
    let (Some((customer_lat, customer_lng)), Some(lat), Some(lng)) =
        (customer, employee_lat, employee_lng)
    else {
        return 0.5;
    };
    let distance = haversine_km(customer_lat, customer_lng, lat, lng);
    (1.0 - distance / max_km).max(0.0)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ============================================================================
// Ranking
// ============================================================================

/// Score, sort and truncate a candidate list.
///
/// Ties order by profile id ascending so equal scores rank deterministically.
pub fn score_candidates(
    candidates: Vec<EmployeeProfileResponse>,
    request: &MatchRequest,
) -> Vec<RankedEmployee> {
    let required: HashSet<Uuid> = request.required_skills.iter().copied().collect();

    let mut results: Vec<RankedEmployee> = candidates
        .into_iter()
        .map(|profile| {
            let employee_skills: HashSet<Uuid> = profile.skills.iter().map(|s| s.id).collect();
            let s_score = skill_score(&employee_skills, &required);
            let r_score = rating_score(profile.avg_rating);
            let p_score = proximity_score(
                request.customer_location,
                profile.latitude,
                profile.longitude,
                request.max_km,
            );

            // Weighted sum - adjust weights or swap with a trained model
            let score = round_to(
                s_score * SKILL_WEIGHT + r_score * RATING_WEIGHT + p_score * PROXIMITY_WEIGHT,
                4,
            );

            RankedEmployee {
                profile,
                score,
                breakdown: ScoreBreakdown {
                    skill: round_to(s_score, 2),
                    rating: round_to(r_score, 2),
                    proximity: round_to(p_score, 2),
                },
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.profile.id.cmp(&b.profile.id))
    });
    results.truncate(request.limit);
    results
}

/// Rank employees matching the availability filter by match score.
pub async fn rank_employees(
    db: &PgPool,
    request: &MatchRequest,
) -> Result<Vec<RankedEmployee>, sqlx::Error> {
    let candidates = load_candidates(db, request.availability.as_deref()).await?;
    Ok(score_candidates(candidates, request))
}

// ============================================================================
// Smart search
// ============================================================================

/// Whitespace tokens of a free-text query.
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

/// Token-based OR search over skill name, bio, city, first/last name and
/// username, restricted to available employees.
///
/// Tokens combine with OR: "plumber downtown" matches anyone matching either
/// token. Recall-favoring on purpose.
pub async fn smart_search(
    db: &PgPool,
    query: &str,
) -> Result<Vec<EmployeeProfileResponse>, sqlx::Error> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT p.id, p.user_id, u.username, u.first_name, u.last_name, u.city,
               p.bio, p.hourly_rate, p.daily_rate, p.monthly_rate, p.availability,
               p.experience_years, p.is_verified, p.avg_rating, p.total_jobs,
               p.latitude, p.longitude, p.created_at
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.availability = 'available'
        AND EXISTS (
            SELECT 1 FROM unnest($1::text[]) AS tok
            WHERE p.bio ILIKE '%' || tok || '%'
               OR u.city ILIKE '%' || tok || '%'
               OR u.first_name ILIKE '%' || tok || '%'
               OR u.last_name ILIKE '%' || tok || '%'
               OR u.username ILIKE '%' || tok || '%'
               OR EXISTS (
                    SELECT 1
                    FROM employee_skills es
                    JOIN skills s ON s.id = es.skill_id
                    WHERE es.profile_id = p.id AND s.name ILIKE '%' || tok || '%'
               )
        )
        ORDER BY p.avg_rating DESC
        "#,
    )
    .bind(&tokens)
    .fetch_all(db)
    .await?;

    hydrate_profiles(db, rows).await
}

// ============================================================================
// Candidate loading
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
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

#[derive(Debug, sqlx::FromRow)]
struct ProfileSkillRow {
    profile_id: Uuid,
    id: Uuid,
    name: String,
    category: Option<String>,
    created_at: DateTime<Utc>,
}

async fn load_candidates(
    db: &PgPool,
    availability: Option<&str>,
) -> Result<Vec<EmployeeProfileResponse>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT p.id, p.user_id, u.username, u.first_name, u.last_name, u.city,
               p.bio, p.hourly_rate, p.daily_rate, p.monthly_rate, p.availability,
               p.experience_years, p.is_verified, p.avg_rating, p.total_jobs,
               p.latitude, p.longitude, p.created_at
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE ($1::text IS NULL OR p.availability = $1)
        "#,
    )
    .bind(availability)
    .fetch_all(db)
    .await?;

    hydrate_profiles(db, rows).await
}

/// Attach each profile's skill list and build the response DTOs.
async fn hydrate_profiles(
    db: &PgPool,
    rows: Vec<ProfileRow>,
) -> Result<Vec<EmployeeProfileResponse>, sqlx::Error> {
    let profile_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let skill_rows = sqlx::query_as::<_, ProfileSkillRow>(
        r#"
        SELECT es.profile_id, s.id, s.name, s.category, s.created_at
        FROM employee_skills es
        JOIN skills s ON s.id = es.skill_id
        WHERE es.profile_id = ANY($1)
        ORDER BY s.name
        "#,
    )
    .bind(&profile_ids)
    .fetch_all(db)
    .await?;

    let mut skills_by_profile: HashMap<Uuid, Vec<Skill>> = HashMap::new();
    for row in skill_rows {
        skills_by_profile
            .entry(row.profile_id)
            .or_default()
            .push(Skill {
                id: row.id,
                name: row.name,
                category: row.category,
                created_at: row.created_at,
            });
    }

    Ok(rows
        .into_iter()
        .map(|r| {
            let skills = skills_by_profile.remove(&r.id).unwrap_or_default();
            EmployeeProfileResponse {
                id: r.id,
                user_id: r.user_id,
                username: r.username,
                first_name: r.first_name,
                last_name: r.last_name,
                city: r.city,
                bio: r.bio,
                skills,
                hourly_rate: r.hourly_rate,
                daily_rate: r.daily_rate,
                monthly_rate: r.monthly_rate,
                availability: r.availability,
                experience_years: r.experience_years,
                is_verified: r.is_verified,
                avg_rating: r.avg_rating,
                total_jobs: r.total_jobs,
                latitude: r.latitude,
                longitude: r.longitude,
                created_at: r.created_at,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill_set(ids: &[u128]) -> HashSet<Uuid> {
        ids.iter().map(|&n| Uuid::from_u128(n)).collect()
    }

    fn profile(
        id: u128,
        skills: &[u128],
        avg_rating: f64,
        coords: Option<(f64, f64)>,
    ) -> EmployeeProfileResponse {
        EmployeeProfileResponse {
            id: Uuid::from_u128(id),
            user_id: Uuid::from_u128(id + 1000),
            username: format!("worker{id}"),
            first_name: None,
            last_name: None,
            city: None,
            bio: None,
            skills: skills
                .iter()
                .map(|&n| Skill {
                    id: Uuid::from_u128(n),
                    name: format!("skill{n}"),
                    category: None,
                    created_at: Utc::now(),
                })
                .collect(),
            hourly_rate: Decimal::ZERO,
            daily_rate: Decimal::ZERO,
            monthly_rate: Decimal::ZERO,
            availability: "available".to_string(),
            experience_years: 0,
            is_verified: true,
            avg_rating,
            total_jobs: 0,
            latitude: coords.map(|(lat, _)| lat),
            longitude: coords.map(|(_, lng)| lng),
            created_at: Utc::now(),
        }
    }

    fn request(skills: &[u128], location: Option<(f64, f64)>, limit: usize) -> MatchRequest {
        MatchRequest {
            required_skills: skills.iter().map(|&n| Uuid::from_u128(n)).collect(),
            customer_location: location,
            availability: Some("available".to_string()),
            limit,
            max_km: 50.0,
        }
    }

    #[test]
    fn skill_score_is_one_when_nothing_required() {
        assert_eq!(skill_score(&skill_set(&[1, 2]), &skill_set(&[])), 1.0);
        assert_eq!(skill_score(&skill_set(&[]), &skill_set(&[])), 1.0);
    }

    #[test]
    fn skill_score_is_zero_for_empty_employee_set() {
        assert_eq!(skill_score(&skill_set(&[]), &skill_set(&[1, 2])), 0.0);
    }

    #[test]
    fn skill_score_is_recall_over_required() {
        let required = skill_set(&[1, 2, 3, 4]);
        assert_eq!(skill_score(&skill_set(&[1, 2]), &required), 0.5);
        // Surplus skills beyond the required set do not penalize
        assert_eq!(
            skill_score(&skill_set(&[1, 2, 3, 4, 5, 6, 7]), &required),
            1.0
        );
    }

    #[test]
    fn rating_score_maps_stars_linearly() {
        assert_eq!(rating_score(0.0), 0.0);
        assert_eq!(rating_score(5.0), 1.0);
        assert!(rating_score(3.0) < rating_score(4.0));
    }

    #[test]
    fn haversine_quarter_circumference() {
        let d = haversine_km(0.0, 0.0, 0.0, 90.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM / 2.0).abs() < 1.0);
    }

    #[test]
    fn proximity_is_neutral_without_coordinates() {
        assert_eq!(proximity_score(None, Some(1.0), Some(1.0), 50.0), 0.5);
        assert_eq!(proximity_score(Some((1.0, 1.0)), None, Some(1.0), 50.0), 0.5);
        assert_eq!(proximity_score(Some((1.0, 1.0)), Some(1.0), None, 50.0), 0.5);
    }

    #[test]
    fn proximity_is_one_at_same_point_and_zero_beyond_radius() {
        assert_eq!(
            proximity_score(Some((52.52, 13.405)), Some(52.52), Some(13.405), 50.0),
            1.0
        );
        // One degree of latitude is ~111 km, past the 50 km radius
        assert_eq!(proximity_score(Some((0.0, 0.0)), Some(1.0), Some(0.0), 50.0), 0.0);
    }

    #[test]
    fn proximity_decays_with_distance() {
        let near = proximity_score(Some((0.0, 0.0)), Some(0.1), Some(0.0), 50.0);
        let far = proximity_score(Some((0.0, 0.0)), Some(0.2), Some(0.0), 50.0);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn scores_combine_with_documented_weights() {
        // Full skill match, 4.0 stars, unknown location:
        // 0.50*1.0 + 0.30*0.8 + 0.20*0.5 = 0.84
        let ranked = score_candidates(vec![profile(1, &[10], 4.0, None)], &request(&[10], None, 20));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0.84);
        assert_eq!(
            ranked[0].breakdown,
            ScoreBreakdown {
                skill: 1.0,
                rating: 0.8,
                proximity: 0.5
            }
        );
    }

    #[test]
    fn ranking_sorts_descending_and_truncates() {
        let candidates = vec![
            profile(1, &[], 1.0, None),
            profile(2, &[10], 5.0, None),
            profile(3, &[10], 3.0, None),
        ];
        let ranked = score_candidates(candidates, &request(&[10], None, 2));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].profile.id, Uuid::from_u128(2));
        assert_eq!(ranked[1].profile.id, Uuid::from_u128(3));
        assert!(ranked[0].score >= ranked[1].score);
        for r in &ranked {
            assert!((0.0..=1.0).contains(&r.score));
        }
    }

    #[test]
    fn equal_scores_order_by_profile_id() {
        let candidates = vec![
            profile(7, &[10], 4.0, None),
            profile(3, &[10], 4.0, None),
            profile(5, &[10], 4.0, None),
        ];
        let ranked = score_candidates(candidates, &request(&[10], None, 20));
        let ids: Vec<Uuid> = ranked.iter().map(|r| r.profile.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(3), Uuid::from_u128(5), Uuid::from_u128(7)]
        );
    }

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("river guide"), vec!["river", "guide"]);
        assert_eq!(tokenize("  padded \t query\n"), vec!["padded", "query"]);
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("").is_empty());
    }
}
