/// User store collaborator
///
/// The session manager reaches credential records only through this narrow
/// interface: unique lookup by email, lookup by primary id, and insert.
/// Email uniqueness is enforced by the store itself, not by callers.

mod postgres;

pub use postgres::PgUserStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

/// A stored credential record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Data for a record that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;

    /// Inserts a new record. A duplicate email must surface as
    /// `AuthError::Conflict`, even when the caller's own existence check
    /// passed moments earlier.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
}
