//! services/api/src/web/middleware.rs
//!
//! Authentication middleware. Session tokens come from an `Authorization: Bearer`
//! header or a `session=` cookie and are resolved by the identity provider.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::state::{AppState, Caller};

/// Extracts the session token from the request headers, preferring the bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|t| !t.is_empty())
}

/// Middleware that resolves the optional caller identity.
///
/// Always inserts a [`Caller`] into request extensions. Unknown or rejected
/// tokens yield an anonymous caller, and so does a failing identity provider:
/// public routes keep working and protected routes answer 401.
pub async fn resolve_caller(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = extract_token(req.headers()).map(str::to_owned);
    let caller = match token {
        Some(token) => match state.identity.resolve_caller(&token).await {
            Ok(user_id) => Caller(user_id),
            Err(e) => {
                warn!("Identity provider failed, treating caller as anonymous: {}", e);
                Caller(None)
            }
        },
        None => Caller(None),
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Middleware for routes that need a caller. Must run after [`resolve_caller`].
///
/// If the caller is anonymous, returns 401 Unauthorized.
pub async fn require_auth(req: Request, next: Next) -> Response {
    let caller = req.extensions().get::<Caller>().copied().unwrap_or_default();
    if caller.user_id().is_none() {
        warn!("Rejected unauthenticated request to {}", req.uri().path());
        return ApiError::Authentication.into_response();
    }
    next.run(req).await
}
