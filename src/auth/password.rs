/// Password hashing and verification
///
/// bcrypt with a per-call random salt: hashing the same password twice
/// yields different digests, and verification is constant-time.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored digest.
///
/// Fails closed: a malformed digest is logged and treated as a mismatch
/// rather than propagated, so no error path can bypass the check.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match verify(password, digest) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password digest could not be verified");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let digest = hash_password("correct horse").expect("failed to hash password");
        assert!(verify_password("correct horse", &digest));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let digest = hash_password("correct horse").expect("failed to hash password");
        assert!(!verify_password("battery staple", &digest));
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let first = hash_password("correct horse").expect("failed to hash password");
        let second = hash_password("correct horse").expect("failed to hash password");

        assert_ne!(first, second);
        assert!(verify_password("correct horse", &first));
        assert!(verify_password("correct horse", &second));
    }

    #[test]
    fn malformed_digest_fails_closed() {
        assert!(!verify_password("anything", "not-a-bcrypt-digest"));
        assert!(!verify_password("anything", ""));
    }
}
