use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::domain::accounts::Role;

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

/// Get current authenticated user info
pub async fn get_me(auth: RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id,
        email: auth.email.clone(),
        role: auth.role,
    })
}
