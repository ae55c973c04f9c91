//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request caller identity.

use crate::config::Config;
use axum::{extract::FromRequestParts, http::request::Parts};
use jokesmith_core::ports::{IdentityService, JokeGenerationService, JokeRepository};
use std::{convert::Infallible, sync::Arc};
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn JokeRepository>,
    pub identity: Arc<dyn IdentityService>,
    /// `None` when no gateway credential is provisioned.
    pub gateway: Option<Arc<dyn JokeGenerationService>>,
    pub config: Arc<Config>,
}

//=========================================================================================
// Caller (Specific to One Request)
//=========================================================================================

/// The caller identity resolved by the auth middleware; `None` for anonymous requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller(pub Option<Uuid>);

impl Caller {
    pub fn user_id(self) -> Option<Uuid> {
        self.0
    }
}

/// Reads the caller placed in the request extensions by the auth middleware.
/// Requests that bypassed the middleware are treated as anonymous.
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Caller>().copied().unwrap_or_default())
    }
}
