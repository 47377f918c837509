/// Authentication module
///
/// Credential hashing, expiry parsing, token issuing/verification and
/// session orchestration.

mod claims;
mod expiry;
mod password;
mod session;
mod token;

pub use claims::Claims;
pub use expiry::parse_expiry;
pub use password::hash_password;
pub use password::verify_password;
pub use session::{
    AuthOutcome, RefreshCookie, SameSitePolicy, SessionManager, REFRESH_COOKIE_NAME,
};
pub use token::TokenIssuer;
