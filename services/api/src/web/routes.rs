//! services/api/src/web/routes.rs
//!
//! Assembles the HTTP router: public and protected API routes, the auth
//! middleware stack, CORS, request tracing and the Swagger UI.

use crate::{
    error::ApiError,
    web::{
        middleware::{require_auth, resolve_caller},
        rest::*,
        state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Anonymous callers allowed. Generation checks auth itself, after validating the body.
    let public_routes = Router::new()
        .route("/api/jokes/generate", post(generate_joke_handler))
        .route("/api/jokes", get(list_jokes_handler))
        .route("/api/jokes/{id}", get(get_joke_handler))
        .route("/api/categories", get(list_categories_handler))
        .route("/api/models", get(list_models_handler));

    let protected_routes = Router::new()
        .route("/api/jokes/{id}/rating", post(rate_joke_handler))
        .route("/api/jokes/{id}/favorite", post(toggle_favorite_handler))
        .route(
            "/api/preferences",
            get(get_preferences_handler).put(update_preferences_handler),
        )
        .route("/api/me/favorites", get(list_favorites_handler))
        .route("/api/me/history", get(list_history_handler))
        .route_layer(axum_middleware::from_fn(require_auth));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            resolve_caller,
        ))
        .with_state(app_state);

    Ok(Router::new()
        .route("/health", get(health_handler))
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
