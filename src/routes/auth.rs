/// Authentication routes
///
/// Thin boundary over the session manager: deserialize and validate input,
/// run the operation, then apply its cookie-binding instruction to the real
/// response. This is the only module that turns a `RefreshCookie` into an
/// actual Set-Cookie header.

use actix_web::cookie::{time::OffsetDateTime, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    RefreshCookie, SameSitePolicy, SessionManager, TokenIssuer, REFRESH_COOKIE_NAME,
};
use crate::error::{AppError, AuthError};
use crate::middleware::AuthenticatedUser;
use crate::store::UserStore;
use crate::validators::{validate_login, validate_register};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register, login and refresh. The refresh token is
/// transported exclusively in the httpOnly cookie and never appears here.
#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

impl AccessTokenResponse {
    fn new(access_token: String, issuer: &TokenIssuer) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: issuer.access_ttl_ms() / 1_000,
        }
    }
}

/// Applies the session manager's cookie instruction to the response.
fn bind_refresh_cookie(binding: &RefreshCookie) -> Cookie<'static> {
    let expires = OffsetDateTime::from_unix_timestamp(binding.expires_at_ms / 1_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    Cookie::build(REFRESH_COOKIE_NAME, binding.value.clone())
        .domain(binding.domain.clone())
        .path("/")
        .expires(expires)
        .http_only(binding.http_only)
        .secure(binding.secure)
        .same_site(match binding.same_site {
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        })
        .finish()
}

/// POST /auth/register
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionManager>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let input = validate_register(&form.name, &form.email, &form.password)?;

    let outcome = sessions
        .register(&input.name, &input.email, &input.password)
        .await?;

    Ok(HttpResponse::Created()
        .cookie(bind_refresh_cookie(&outcome.cookie))
        .json(AccessTokenResponse::new(outcome.access_token, &issuer)))
}

/// POST /auth/login
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let input = validate_login(&form.email, &form.password)?;

    let outcome = sessions.login(&input.email, &input.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(bind_refresh_cookie(&outcome.cookie))
        .json(AccessTokenResponse::new(outcome.access_token, &issuer)))
}

/// POST /auth/refresh
///
/// Reads the refresh cookie, rotates the pair, overwrites the cookie.
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let cookie = req.cookie(REFRESH_COOKIE_NAME);
    let value = cookie.as_ref().map(|c| c.value());

    let outcome = sessions.refresh(value).await?;

    Ok(HttpResponse::Ok()
        .cookie(bind_refresh_cookie(&outcome.cookie))
        .json(AccessTokenResponse::new(outcome.access_token, &issuer)))
}

/// POST /auth/logout
///
/// Overwrites the refresh cookie with an empty, already-expired value.
/// No verification; idempotent.
pub async fn logout(sessions: web::Data<SessionManager>) -> Result<HttpResponse, AppError> {
    let cleared = sessions.logout();

    Ok(HttpResponse::Ok()
        .cookie(bind_refresh_cookie(&cleared))
        .json(serde_json::json!({ "message": "logged out" })))
}

/// GET /auth/me (guarded)
pub async fn get_current_user(
    identity: web::ReqData<AuthenticatedUser>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_by_id(&identity.id)
        .await?
        .ok_or(AuthError::NotFound("user not found"))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
        name: user.name,
        created_at: user.created_at.to_rfc3339(),
    }))
}
