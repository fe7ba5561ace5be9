//! Access token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with a local secret; verification
//! validates signature, expiry and issuer.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::Claims;
use crate::config::Settings;
use crate::domain::users::User;

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl_seconds,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.jwt_secret,
            settings.jwt_issuer.clone(),
            settings.jwt_ttl_seconds,
        )
    }

    /// Issue a fresh access token for the given account.
    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_seconds,
            email: Some(user.email.clone()),
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify a bearer token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let keys = TokenKeys::new("secret", "vibes-backend", 3600);
        let user = test_user();

        let token = keys.issue(&user).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert_eq!(claims.iss, "vibes-backend");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = TokenKeys::new("secret", "vibes-backend", 3600);
        let other = TokenKeys::new("different", "vibes-backend", 3600);

        let token = other.issue(&test_user()).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let keys = TokenKeys::new("secret", "vibes-backend", 3600);
        let other = TokenKeys::new("secret", "someone-else", 3600);

        let token = other.issue(&test_user()).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative TTL puts the expiry beyond the default leeway.
        let keys = TokenKeys::new("secret", "vibes-backend", -120);

        let token = keys.issue(&test_user()).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
