//! Notification service
//!
//! Creates in-app notification rows when booking and review events occur.
//! Dispatch is best-effort: callers log and swallow failures so a broken
//! notification never fails the triggering request.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notifications::NotificationType;

/// Create a notification for a user
pub async fn create_notification(
    db: &PgPool,
    user_id: Uuid,
    notification_type: NotificationType,
    title: &str,
    message: Option<&str>,
    data: Option<serde_json::Value>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let type_str = notification_type.to_string();
    let data = data.unwrap_or(serde_json::json!({}));

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, type, title, message, data)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&type_str)
    .bind(title)
    .bind(message)
    .bind(&data)
    .execute(db)
    .await?;

    tracing::info!(
        user_id = %user_id,
        notification_type = %type_str,
        notification_id = %id,
        "Notification created"
    );

    Ok(id)
}

/// Notify an employee about a new booking request
pub async fn notify_booking_requested(
    db: &PgPool,
    employee_user_id: Uuid,
    booking_id: Uuid,
    booking_title: &str,
    customer_name: &str,
    total_cost: Decimal,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        employee_user_id,
        NotificationType::BookingRequested,
        &format!("New booking request: {}", booking_title),
        Some(&format!(
            "{} requested a booking. Estimated cost: ${}. Accept or reject it from your bookings.",
            customer_name, total_cost
        )),
        Some(serde_json::json!({
            "booking_id": booking_id,
            "booking_title": booking_title,
            "customer_name": customer_name,
            "total_cost": total_cost,
        })),
    )
    .await
}

/// Notify the other party that a booking changed status
pub async fn notify_booking_status_changed(
    db: &PgPool,
    recipient_user_id: Uuid,
    booking_id: Uuid,
    booking_title: &str,
    new_status: &str,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        recipient_user_id,
        NotificationType::BookingStatusChanged,
        &format!("Booking {} is now {}", booking_title, new_status),
        Some(&format!(
            "The booking \"{}\" moved to {}. Check your dashboard for details.",
            booking_title, new_status
        )),
        Some(serde_json::json!({
            "booking_id": booking_id,
            "booking_title": booking_title,
            "status": new_status,
        })),
    )
    .await
}

/// Notify an employee about a new review
pub async fn notify_review_received(
    db: &PgPool,
    employee_user_id: Uuid,
    booking_id: Uuid,
    booking_title: &str,
    rating: i32,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        employee_user_id,
        NotificationType::ReviewReceived,
        &format!("New {}-star review", rating),
        Some(&format!(
            "You received a review for \"{}\". Rating: {}/5",
            booking_title, rating
        )),
        Some(serde_json::json!({
            "booking_id": booking_id,
            "booking_title": booking_title,
            "rating": rating,
        })),
    )
    .await
}

/// Notify an employee their profile was verified
pub async fn notify_employee_verified(
    db: &PgPool,
    employee_user_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        employee_user_id,
        NotificationType::EmployeeVerified,
        "Your profile has been verified",
        Some("An administrator verified your employee profile. The verification badge is now visible to customers."),
        None,
    )
    .await
}
