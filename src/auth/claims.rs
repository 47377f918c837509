/// Token claim set
///
/// The payload carried by both access and refresh tokens: the subject
/// identity plus standard expiry metadata. Deserialization rejects payloads
/// without an `id` claim, so a structurally valid but foreign JWT cannot
/// pass verification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject identity (user id as a UUID string).
    pub id: String,
    /// Issued at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds).
    pub exp: i64,
}

impl Claims {
    /// Builds a claim set expiring `ttl_ms` milliseconds from now.
    pub fn new(user_id: &Uuid, ttl_ms: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: user_id.to_string(),
            iat: now,
            exp: now + ttl_ms / 1_000,
        }
    }

    /// The verified subject identity.
    ///
    /// An `id` claim that is not a UUID is treated as a malformed payload,
    /// indistinguishable from any other verification failure.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.id).map_err(|_| AuthError::InvalidToken.into())
    }
}
