pub mod admin;
pub mod bookings;
pub mod health;
pub mod matching;
pub mod me;
pub mod notifications;
pub mod profiles;
pub mod skills;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Identity
        .route("/me", get(me::get_me))
        // Skills
        .route("/skills", get(skills::list_skills).post(skills::create_skill))
        // Own profiles
        .route(
            "/me/employee-profile",
            post(profiles::create_employee_profile)
                .get(profiles::get_my_employee_profile)
                .put(profiles::update_employee_profile),
        )
        .route(
            "/me/customer-profile",
            post(profiles::create_customer_profile)
                .get(profiles::get_my_customer_profile)
                .put(profiles::update_customer_profile),
        )
        // Matching & search
        .route("/employees", get(matching::list_ranked_employees))
        .route("/employees/search", get(matching::search_employees))
        .route("/employees/:user_id", get(profiles::get_public_employee))
        // Bookings
        .route(
            "/employees/:user_id/bookings",
            post(bookings::create_booking),
        )
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/:booking_id", get(bookings::get_booking))
        .route(
            "/bookings/:booking_id/actions/:action",
            post(bookings::booking_action),
        )
        .route(
            "/bookings/:booking_id/review",
            post(bookings::create_review).get(bookings::get_review),
        )
        .route(
            "/bookings/:booking_id/work-proofs",
            post(bookings::create_work_proof).get(bookings::list_work_proofs),
        )
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::get_unread_count),
        )
        .route("/notifications/mark-read", post(notifications::mark_read))
        // Admin
        .route("/admin/stats", get(admin::get_admin_stats))
        .route(
            "/admin/employees/:profile_id/verify",
            post(admin::verify_employee),
        )
}
