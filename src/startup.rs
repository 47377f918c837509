use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{SessionManager, TokenIssuer};
use crate::configuration::Settings;
use crate::error::AppError;
use crate::middleware::AuthGuard;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};
use crate::store::UserStore;

/// Builds the server: constructs the token issuer (parsing the configured
/// TTLs — fatal here, not per-request) and the session manager once, then
/// shares them read-only across workers.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    settings: Settings,
) -> Result<Server, AppError> {
    let issuer = TokenIssuer::from_settings(&settings.jwt)?;

    let sessions = web::Data::new(SessionManager::new(
        store.clone(),
        issuer.clone(),
        settings.cookie.domain.clone(),
        settings.application.development,
    ));
    let issuer_data = web::Data::new(issuer.clone());
    let store_data: web::Data<dyn UserStore> = web::Data::from(store);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Shared state
            .app_data(sessions.clone())
            .app_data(issuer_data.clone())
            .app_data(store_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            // Protected routes
            .service(
                web::scope("/auth")
                    .wrap(AuthGuard::new(issuer.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)
    .map_err(|e| AppError::Internal(format!("failed to bind listener: {}", e)))?
    .run();

    Ok(server)
}
