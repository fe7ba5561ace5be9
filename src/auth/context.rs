use super::Claims;
use uuid::Uuid;

/// Authenticated user context extracted from a verified token
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from the sub claim)
    pub user_id: Uuid,

    /// User email if the token carried one
    pub email: Option<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
        })
    }
}
