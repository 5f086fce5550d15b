use uuid::Uuid;

use super::Claims;
use crate::domain::accounts::Role;

/// Authenticated user context extracted from a verified JWT.
/// Attached to handlers through the `RequireAuth` extractor.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from JWT sub claim)
    pub user_id: Uuid,

    /// User email if available
    pub email: Option<String>,

    /// Account role
    pub role: Role,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
        let role = Role::parse(&claims.role).ok_or("Unknown role in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role,
        })
    }
}
