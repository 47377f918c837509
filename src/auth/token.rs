/// Token issuing and verification
///
/// One issuer signs both halves of the token pair with the process-wide
/// secret: short-lived access tokens and long-lived refresh tokens differ
/// only in TTL. The issuer is immutable after construction and cheap to
/// clone across workers.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::expiry::parse_expiry;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    access_ttl_ms: i64,
    refresh_ttl_ms: i64,
}

impl TokenIssuer {
    /// Builds an issuer from settings, parsing both TTL strings once.
    ///
    /// # Errors
    /// Returns a configuration error for a malformed TTL string. Callers
    /// treat this as fatal at startup.
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, AppError> {
        let access_ttl_ms = parse_expiry(&settings.access_token_expires_in)?;
        let refresh_ttl_ms = parse_expiry(&settings.refresh_token_expires_in)?;

        Ok(Self {
            secret: settings.secret.clone(),
            access_ttl_ms,
            refresh_ttl_ms,
        })
    }

    pub fn access_ttl_ms(&self) -> i64 {
        self.access_ttl_ms
    }

    pub fn refresh_ttl_ms(&self) -> i64 {
        self.refresh_ttl_ms
    }

    /// Signs a short-lived access token for the given identity.
    pub fn sign_access(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.sign(user_id, self.access_ttl_ms)
    }

    /// Signs a long-lived refresh token for the given identity.
    pub fn sign_refresh(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.sign(user_id, self.refresh_ttl_ms)
    }

    fn sign(&self, user_id: &Uuid, ttl_ms: i64) -> Result<String, AppError> {
        encode(
            &Header::default(),
            &Claims::new(user_id, ttl_ms),
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verifies a token's signature and expiry and returns its claims.
    ///
    /// Bad signature, elapsed expiry and malformed payloads (including a
    /// missing `id` claim) all collapse into the same error; callers never
    /// learn which check failed.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "token verification failed");
            AuthError::InvalidToken.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::from_settings(&JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expires_in: "15m".to_string(),
            refresh_token_expires_in: "7d".to_string(),
        })
        .expect("failed to build issuer")
    }

    #[test]
    fn parses_ttls_at_construction() {
        let issuer = test_issuer();
        assert_eq!(issuer.access_ttl_ms(), 900_000);
        assert_eq!(issuer.refresh_ttl_ms(), 604_800_000);
    }

    #[test]
    fn malformed_ttl_is_a_construction_error() {
        let result = TokenIssuer::from_settings(&JwtSettings {
            secret: "irrelevant".to_string(),
            access_token_expires_in: "1x".to_string(),
            refresh_token_expires_in: "7d".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn signs_and_verifies_round_trip() {
        let issuer = test_issuer();
        let user_id = Uuid::new_v4();

        let token = issuer.sign_access(&user_id).expect("failed to sign");
        let claims = issuer.verify(&token).expect("failed to verify");

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let issuer = test_issuer();
        let user_id = Uuid::new_v4();

        let access = issuer.verify(&issuer.sign_access(&user_id).unwrap()).unwrap();
        let refresh = issuer.verify(&issuer.sign_refresh(&user_id).unwrap()).unwrap();

        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn rejects_tampered_token() {
        let issuer = test_issuer();
        let token = issuer.sign_access(&Uuid::new_v4()).expect("failed to sign");

        let tampered = format!("{}X", token);
        assert!(issuer.verify(&tampered).is_err());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = test_issuer();
        let other = TokenIssuer::from_settings(&JwtSettings {
            secret: "a-completely-different-signing-secret!!".to_string(),
            access_token_expires_in: "15m".to_string(),
            refresh_token_expires_in: "7d".to_string(),
        })
        .unwrap();

        let token = other.sign_access(&Uuid::new_v4()).expect("failed to sign");
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let issuer = test_issuer();
        let token = issuer.sign(&Uuid::new_v4(), -60_000).expect("failed to sign");

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn rejects_payload_without_id_claim() {
        #[derive(serde::Serialize)]
        struct Anonymous {
            iat: i64,
            exp: i64,
        }

        let issuer = test_issuer();
        let now = chrono::Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &Anonymous { iat: now, exp: now + 900 },
            &EncodingKey::from_secret(issuer.secret.as_bytes()),
        )
        .unwrap();

        assert!(issuer.verify(&token).is_err());
    }
}
