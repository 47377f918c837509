/// Unified error handling
///
/// Domain-specific error types are kept separate (validation, auth, store,
/// config) and unified into `AppError`, which maps onto HTTP responses at
/// the actix boundary. Handlers and services only ever produce tagged error
/// values; status codes and response bodies are decided here.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// A single failed field rule, as reported by the input validators.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Authentication and session errors.
///
/// `NotFound` is deliberately overloaded: unknown email, wrong password and
/// missing/invalid refresh tokens all surface through it so the response
/// gives callers no oracle to enumerate accounts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Duplicate registration, whether caught by the upfront lookup or by
    /// the store's unique constraint.
    Conflict,
    NotFound(&'static str),
    MissingToken,
    InvalidToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Conflict => write!(f, "email already registered"),
            AuthError::NotFound(msg) => write!(f, "{}", msg),
            AuthError::MissingToken => write!(f, "missing token"),
            AuthError::InvalidToken => write!(f, "invalid or expired token"),
        }
    }
}

impl StdError for AuthError {}

/// User store failures that are not part of the domain contract.
#[derive(Debug)]
pub enum StoreError {
    Unavailable(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "store query failed: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Configuration errors. Fatal at startup, never per-request recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidExpiry(String),
    UnsupportedUnit(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(key) => write!(f, "missing required config: {}", key),
            ConfigError::InvalidExpiry(raw) => {
                write!(f, "invalid expiry duration {:?} (expected <integer><s|m|h|d>)", raw)
            }
            ConfigError::UnsupportedUnit(raw) => {
                write!(f, "unsupported expiry unit in {:?} (expected one of s, m, h, d)", raw)
            }
        }
    }
}

impl StdError for ConfigError {}

/// Central application error, the single type handlers return.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldError>),
    Auth(AuthError),
    Store(StoreError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{}", joined)
            }
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        AppError::Validation(errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // The unique index on users.email is the true enforcer of the
            // duplicate-registration contract; a lost check-then-create race
            // lands here and must look identical to the upfront check.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::Auth(AuthError::Conflict)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Store(StoreError::Unavailable(err.to_string()))
            }
            _ => AppError::Store(StoreError::Query(err.to_string())),
        }
    }
}

/// JSON body returned for every error response.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique id for correlating the response with server logs.
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(AuthError::Conflict) => "CONFLICT",
            AppError::Auth(AuthError::NotFound(_)) => "NOT_FOUND",
            AppError::Auth(AuthError::MissingToken) => "MISSING_TOKEN",
            AppError::Auth(AuthError::InvalidToken) => "TOKEN_INVALID",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message exposed to the client. Server-side failures keep their detail
    /// in the logs only.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(_) | AppError::Auth(_) => self.to_string(),
            AppError::Store(StoreError::Unavailable(_)) => {
                "service temporarily unavailable".to_string()
            }
            AppError::Store(_) | AppError::Internal(_) => "internal server error".to_string(),
            AppError::Config(_) => "server configuration error".to_string(),
        }
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Validation(_) | AppError::Auth(_) => {
                tracing::warn!(error_id = error_id, error = %self, "request rejected");
            }
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(error_id = error_id, error = %self, "request failed");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Conflict) => StatusCode::CONFLICT,
            AppError::Auth(AuthError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Auth(AuthError::MissingToken) | AppError::Auth(AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let status = self.status_code();
        let body = ErrorResponse::new(
            error_id,
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );

        HttpResponse::build(status).json(body)
    }
}
