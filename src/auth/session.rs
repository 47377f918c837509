/// Session management
///
/// Orchestrates registration, login, refresh and logout over the hasher,
/// the token issuer and the user store. The manager never touches the HTTP
/// transport: every operation that binds a refresh token returns a
/// `RefreshCookie` instruction, and the route layer is the only place that
/// instruction becomes a real Set-Cookie header. Keeping the cookie policy
/// in one spot means register, login and refresh cannot drift apart in
/// their cookie attributes.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenIssuer;
use crate::error::{AppError, AuthError};
use crate::store::{NewUser, UserStore};

/// Name of the httpOnly cookie carrying the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Uniform login failure: unknown email and wrong password are deliberately
/// indistinguishable.
const BAD_CREDENTIALS: &str = "invalid email or password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    Lax,
    None,
}

/// Structured set-cookie instruction for the refresh token.
///
/// `expires_at_ms` is always recomputed as now + refresh TTL at issuance
/// time; a cleared cookie carries an empty value and the Unix epoch.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    pub value: String,
    pub domain: String,
    pub expires_at_ms: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

/// Result of a successful register, login or refresh: the access token for
/// the response body plus the cookie binding. The refresh token lives only
/// inside the cookie instruction.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub access_token: String,
    pub cookie: RefreshCookie,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    issuer: TokenIssuer,
    cookie_domain: String,
    development: bool,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        issuer: TokenIssuer,
        cookie_domain: String,
        development: bool,
    ) -> Self {
        Self {
            store,
            issuer,
            cookie_domain,
            development,
        }
    }

    /// Registers a new account and opens a session for it.
    ///
    /// The upfront lookup gives the common duplicate a fast answer; the
    /// store's unique constraint catches the check-then-create race and
    /// surfaces as the same `Conflict`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, AppError> {
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict.into());
        }

        let password_hash = hash_password(password)?;
        let user = self
            .store
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");

        self.issue_and_bind(&user.id)
    }

    /// Authenticates an email/password pair and opens a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, AppError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound(BAD_CREDENTIALS))?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::NotFound(BAD_CREDENTIALS).into());
        }

        tracing::info!(user_id = %user.id, "user logged in");

        self.issue_and_bind(&user.id)
    }

    /// Rotates the session from the refresh cookie: a brand-new token pair
    /// is minted and the cookie overwritten on every call.
    ///
    /// The subject is re-looked-up by its verified id rather than trusted
    /// from the claim, so tokens for deleted accounts stop working.
    pub async fn refresh(&self, cookie: Option<&str>) -> Result<AuthOutcome, AppError> {
        let token = cookie.ok_or(AuthError::NotFound("refresh token missing"))?;

        let claims = self
            .issuer
            .verify(token)
            .map_err(|_| AuthError::NotFound("invalid refresh token"))?;
        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::NotFound("invalid refresh token"))?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::NotFound("invalid refresh token"))?;

        tracing::info!(user_id = %user.id, "session refreshed");

        self.issue_and_bind(&user.id)
    }

    /// Clears the refresh cookie client-side: empty value, expiry at the
    /// epoch. Performs no verification and is idempotent.
    pub fn logout(&self) -> RefreshCookie {
        self.bind_cookie(String::new(), 0)
    }

    fn issue_and_bind(&self, user_id: &Uuid) -> Result<AuthOutcome, AppError> {
        let access_token = self.issuer.sign_access(user_id)?;
        let refresh_token = self.issuer.sign_refresh(user_id)?;

        // Cookie lifetime is recomputed from configuration on every issue,
        // never read back from the token's own claim.
        let expires_at_ms = Utc::now().timestamp_millis() + self.issuer.refresh_ttl_ms();

        Ok(AuthOutcome {
            access_token,
            cookie: self.bind_cookie(refresh_token, expires_at_ms),
        })
    }

    /// Single source of the cookie attribute policy, shared by issuance and
    /// logout so the two cannot drift apart.
    fn bind_cookie(&self, value: String, expires_at_ms: i64) -> RefreshCookie {
        RefreshCookie {
            value,
            domain: self.cookie_domain.clone(),
            expires_at_ms,
            http_only: true,
            secure: !self.development,
            same_site: if self.development {
                SameSitePolicy::None
            } else {
                SameSitePolicy::Lax
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::store::User;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == *id).cloned())
        }

        async fn create(&self, user: NewUser) -> Result<User, AppError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                return Err(AuthError::Conflict.into());
            }
            let record = User {
                id: Uuid::new_v4(),
                email: user.email,
                name: user.name,
                password_hash: user.password_hash,
                created_at: Utc::now(),
            };
            users.push(record.clone());
            Ok(record)
        }
    }

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::from_settings(&JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expires_in: "15m".to_string(),
            refresh_token_expires_in: "7d".to_string(),
        })
        .expect("failed to build issuer")
    }

    fn manager_with(store: Arc<MemoryStore>, development: bool) -> SessionManager {
        SessionManager::new(store, test_issuer(), "example.com".to_string(), development)
    }

    fn unwrap_auth_err(result: Result<AuthOutcome, AppError>) -> AuthError {
        match result.unwrap_err() {
            AppError::Auth(e) => e,
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_issues_tokens_and_binds_cookie() {
        let store = Arc::new(MemoryStore::default());
        let manager = manager_with(store.clone(), false);

        let before = Utc::now().timestamp_millis();
        let outcome = manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");
        let after = Utc::now().timestamp_millis();

        // Both tokens verify against the issuer and carry the stored id.
        let issuer = test_issuer();
        let user = store.find_by_email("john@example.com").await.unwrap().unwrap();
        let access = issuer.verify(&outcome.access_token).unwrap();
        let refresh = issuer.verify(&outcome.cookie.value).unwrap();
        assert_eq!(access.user_id().unwrap(), user.id);
        assert_eq!(refresh.user_id().unwrap(), user.id);

        // Cookie policy: httpOnly, configured domain, fresh expiry.
        let cookie = &outcome.cookie;
        assert!(cookie.http_only);
        assert_eq!(cookie.domain, "example.com");
        assert!(cookie.expires_at_ms >= before + issuer.refresh_ttl_ms());
        assert!(cookie.expires_at_ms <= after + issuer.refresh_ttl_ms());

        // Outside development: Secure and SameSite=Lax.
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSitePolicy::Lax);
    }

    #[tokio::test]
    async fn development_mode_relaxes_cookie_attributes() {
        let manager = manager_with(Arc::new(MemoryStore::default()), true);

        let outcome = manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");

        assert!(!outcome.cookie.secure);
        assert_eq!(outcome.cookie.same_site, SameSitePolicy::None);
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let store = Arc::new(MemoryStore::default());
        let manager = manager_with(store.clone(), false);

        manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");

        let user = store.find_by_email("john@example.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(verify_password("secret1", &user.password_hash));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_without_mutation() {
        let store = Arc::new(MemoryStore::default());
        let manager = manager_with(store.clone(), false);

        manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("first registration failed");

        let err = unwrap_auth_err(manager.register("Jane", "john@example.com", "other12").await);
        assert_eq!(err, AuthError::Conflict);
        assert_eq!(store.users.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let manager = manager_with(Arc::new(MemoryStore::default()), false);
        manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");

        let wrong_password = unwrap_auth_err(manager.login("john@example.com", "wrong!!").await);
        let unknown_email = unwrap_auth_err(manager.login("jane@example.com", "secret1").await);

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password, AuthError::NotFound(BAD_CREDENTIALS));
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_credentials() {
        let manager = manager_with(Arc::new(MemoryStore::default()), false);
        manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");

        let outcome = manager
            .login("john@example.com", "secret1")
            .await
            .expect("login failed");
        assert!(!outcome.access_token.is_empty());
        assert!(!outcome.cookie.value.is_empty());
    }

    #[tokio::test]
    async fn refresh_requires_a_cookie() {
        let manager = manager_with(Arc::new(MemoryStore::default()), false);

        let err = unwrap_auth_err(manager.refresh(None).await);
        assert_eq!(err, AuthError::NotFound("refresh token missing"));
    }

    #[tokio::test]
    async fn refresh_rejects_garbled_tokens() {
        let manager = manager_with(Arc::new(MemoryStore::default()), false);

        let err = unwrap_auth_err(manager.refresh(Some("not.a.jwt")).await);
        assert_eq!(err, AuthError::NotFound("invalid refresh token"));
    }

    #[tokio::test]
    async fn refresh_rejects_tokens_for_deleted_subjects() {
        let store = Arc::new(MemoryStore::default());
        let manager = manager_with(store.clone(), false);

        let outcome = manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");

        store.users.lock().unwrap().clear();

        let err = unwrap_auth_err(manager.refresh(Some(&outcome.cookie.value)).await);
        assert_eq!(err, AuthError::NotFound("invalid refresh token"));
    }

    #[tokio::test]
    async fn refresh_rotates_the_token_pair() {
        let manager = manager_with(Arc::new(MemoryStore::default()), false);
        let first = manager
            .register("John", "john@example.com", "secret1")
            .await
            .expect("registration failed");

        // Claims carry second-granularity timestamps; cross a second
        // boundary so the rotated pair provably differs.
        std::thread::sleep(std::time::Duration::from_millis(1100));

        let second = manager
            .refresh(Some(&first.cookie.value))
            .await
            .expect("refresh failed");

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.cookie.value, second.cookie.value);
        assert!(second.cookie.expires_at_ms > first.cookie.expires_at_ms);

        // The rotated cookie keeps working.
        let third = manager
            .refresh(Some(&second.cookie.value))
            .await
            .expect("second refresh failed");
        assert!(!third.access_token.is_empty());
    }

    #[tokio::test]
    async fn logout_clears_the_cookie() {
        let manager = manager_with(Arc::new(MemoryStore::default()), false);

        let cleared = manager.logout();
        assert!(cleared.value.is_empty());
        assert_eq!(cleared.expires_at_ms, 0);
        assert!(cleared.http_only);
        assert_eq!(cleared.domain, "example.com");

        // Idempotent: a second call yields the same instruction.
        let again = manager.logout();
        assert!(again.value.is_empty());
        assert_eq!(again.expires_at_ms, 0);
    }
}
