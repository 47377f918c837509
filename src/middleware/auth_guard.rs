/// Authorization guard
///
/// Runs in front of every protected route: requires a `Bearer` access
/// token in the Authorization header, verifies it against the token
/// issuer, and injects the resolved identity into request extensions for
/// downstream handlers. A pure verification gate — it never refreshes or
/// mutates tokens.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::error::{AppError, AuthError};

/// Identity attached to the request once the access token verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

pub struct AuthGuard {
    issuer: TokenIssuer,
}

impl AuthGuard {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGuardService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct AuthGuardService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) => token,
            None => {
                tracing::warn!("missing or non-bearer Authorization header");
                return reject(AuthError::MissingToken);
            }
        };

        // Expired, forged and malformed tokens are deliberately collapsed
        // into one rejection so the failure mode is not leaked.
        let identity = self
            .issuer
            .verify(&token)
            .and_then(|claims| claims.user_id());

        match identity {
            Ok(id) => {
                req.extensions_mut().insert(AuthenticatedUser { id });

                tracing::debug!(user_id = %id, "access token verified");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(_) => {
                tracing::warn!("access token rejected");
                reject(AuthError::InvalidToken)
            }
        }
    }
}

fn reject<B>(err: AuthError) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>> {
    let app_err = AppError::from(err.clone());
    let response = app_err.error_response();
    Box::pin(async move {
        Err(actix_web::error::InternalError::from_response(err, response).into())
    })
}
