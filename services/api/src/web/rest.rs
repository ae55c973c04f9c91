//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::ApiError,
    web::{
        generation_task::generation_process,
        listing_task::{listing_process, Page},
        models::*,
        state::{AppState, Caller},
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use jokesmith_core::domain::{ContentFilterLevel, PreferencesUpdate, MAX_RATING, MIN_RATING};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_joke_handler,
        list_jokes_handler,
        get_joke_handler,
        rate_joke_handler,
        toggle_favorite_handler,
        list_categories_handler,
        get_preferences_handler,
        update_preferences_handler,
        list_favorites_handler,
        list_history_handler,
        list_models_handler,
        health_handler,
    ),
    components(
        schemas(
            GenerateJokeRequest, GenerateJokeResponse, JokeResponse, ListJokesResponse, ListMeta,
            RateJokeRequest, RatingResponse, FavoriteResponse, CategoryResponse,
            PreferencesResponse, UpdatePreferencesRequest, HistoryEntryResponse,
            JokeSummaryResponse, FavoritesResponse, HistoryResponse, PageMeta, ModelResponse,
            ModelsResponse, ErrorResponse
        )
    ),
    tags(
        (name = "Jokesmith API", description = "AI joke generation, ratings, favorites and history.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Extraction helpers
//=========================================================================================

// Axum's own rejections answer in plain text; these keep the `{error}` body.

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e.body_text())))
}

fn joke_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::Validation("Invalid joke id".to_string()))
}

fn page_query(query: Result<Query<PageQuery>, QueryRejection>) -> Result<PageQuery, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::Validation(format!("Invalid query string: {}", e.body_text())))
}

fn require_user(caller: Caller) -> Result<Uuid, ApiError> {
    caller.user_id().ok_or(ApiError::Authentication)
}

//=========================================================================================
// Jokes
//=========================================================================================

/// Generate a joke with the LLM gateway and store it for the caller.
#[utoipa::path(
    post,
    path = "/api/jokes/generate",
    request_body = GenerateJokeRequest,
    responses(
        (status = 201, description = "Joke generated and stored", body = GenerateJokeResponse),
        (status = 400, description = "Missing category or invalid options", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 500, description = "Gateway not configured or store failure", body = ErrorResponse),
        (status = 503, description = "LLM gateway unavailable", body = ErrorResponse)
    )
)]
pub async fn generate_joke_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    body: Result<Json<GenerateJokeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(body)?;
    let response = generation_process(app_state, caller, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List public jokes, newest first.
#[utoipa::path(
    get,
    path = "/api/jokes",
    params(PageQuery),
    responses(
        (status = 200, description = "A page of jokes", body = ListJokesResponse),
        (status = 400, description = "Invalid pagination", body = ErrorResponse)
    )
)]
pub async fn list_jokes_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ListJokesResponse>, ApiError> {
    let query = page_query(query)?;
    Ok(Json(listing_process(app_state, caller, query).await?))
}

/// Fetch a single joke with its rating stats.
#[utoipa::path(
    get,
    path = "/api/jokes/{id}",
    params(("id" = Uuid, Path, description = "Joke id")),
    responses(
        (status = 200, description = "The joke", body = JokeResponse),
        (status = 404, description = "No such joke", body = ErrorResponse)
    )
)]
pub async fn get_joke_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<JokeResponse>, ApiError> {
    let id = joke_id(path)?;
    let joke = app_state
        .db
        .get_joke(id, caller.user_id())
        .await?
        .ok_or_else(|| ApiError::NotFound("Joke not found".to_string()))?;
    Ok(Json(joke.into()))
}

/// Rate a joke from 1 to 5. Re-rating overwrites the caller's previous rating.
#[utoipa::path(
    post,
    path = "/api/jokes/{id}/rating",
    params(("id" = Uuid, Path, description = "Joke id")),
    request_body = RateJokeRequest,
    responses(
        (status = 200, description = "The stored rating", body = RatingResponse),
        (status = 400, description = "Rating out of range", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "No such joke", body = ErrorResponse)
    )
)]
pub async fn rate_joke_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RateJokeRequest>, JsonRejection>,
) -> Result<Json<RatingResponse>, ApiError> {
    let user_id = require_user(caller)?;
    let id = joke_id(path)?;
    let request = json_body(body)?;

    let rating = i16::try_from(request.rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            ))
        })?;

    let stored = app_state.db.rate_joke(id, user_id, rating).await?;
    info!(joke_id = %id, user_id = %user_id, rating, "Joke rated");
    Ok(Json(stored.into()))
}

/// Toggle the caller's favorite mark on a joke.
#[utoipa::path(
    post,
    path = "/api/jokes/{id}/favorite",
    params(("id" = Uuid, Path, description = "Joke id")),
    responses(
        (status = 200, description = "The new favorite state", body = FavoriteResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "No such joke", body = ErrorResponse)
    )
)]
pub async fn toggle_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let user_id = require_user(caller)?;
    let id = joke_id(path)?;
    let favorited = app_state.db.toggle_favorite(id, user_id).await?;
    Ok(Json(FavoriteResponse { favorited }))
}

//=========================================================================================
// Categories and Models
//=========================================================================================

/// List the active joke categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active categories", body = [CategoryResponse]))
)]
pub async fn list_categories_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = app_state.db.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// List the models offered by the LLM gateway. Empty when the gateway is unavailable.
#[utoipa::path(
    get,
    path = "/api/models",
    responses((status = 200, description = "Available models", body = ModelsResponse))
)]
pub async fn list_models_handler(State(app_state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let models = match &app_state.gateway {
        Some(gateway) => gateway.list_models().await,
        None => Vec::new(),
    };
    Json(ModelsResponse {
        models: models.into_iter().map(Into::into).collect(),
    })
}

//=========================================================================================
// Caller-scoped Resources
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/preferences",
    responses(
        (status = 200, description = "The caller's preferences", body = PreferencesResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "No preferences saved yet", body = ErrorResponse)
    )
)]
pub async fn get_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let user_id = require_user(caller)?;
    let preferences = app_state
        .db
        .get_user_preferences(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Preferences not found".to_string()))?;
    Ok(Json(preferences.into()))
}

/// Create or update the caller's preferences. Omitted fields keep their stored value.
#[utoipa::path(
    put,
    path = "/api/preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "The stored preferences", body = PreferencesResponse),
        (status = 400, description = "Invalid preference values", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn update_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    body: Result<Json<UpdatePreferencesRequest>, JsonRejection>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let user_id = require_user(caller)?;
    let request = json_body(body)?;

    let content_filter_level = request
        .content_filter_level
        .as_deref()
        .map(str::parse::<ContentFilterLevel>)
        .transpose()
        .map_err(ApiError::Validation)?;
    if request.max_joke_length.is_some_and(|len| len <= 0) {
        return Err(ApiError::Validation(
            "max_joke_length must be positive".to_string(),
        ));
    }

    let update = PreferencesUpdate {
        preferred_categories: request.preferred_categories,
        content_filter_level,
        max_joke_length: request.max_joke_length,
        favorite_models: request.favorite_models,
    };
    let stored = app_state.db.upsert_user_preferences(user_id, update).await?;
    Ok(Json(stored.into()))
}

/// The caller's favorite jokes, most recently favorited first.
#[utoipa::path(
    get,
    path = "/api/me/favorites",
    params(PageQuery),
    responses(
        (status = 200, description = "A page of favorites", body = FavoritesResponse),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn list_favorites_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let user_id = require_user(caller)?;
    let query = page_query(query)?;
    let page = Page::parse(
        query.limit.as_deref(),
        query.offset.as_deref(),
        app_state.config.max_page_limit,
    )?;

    let jokes = app_state
        .db
        .list_user_favorites(user_id, page.limit, page.offset)
        .await?;
    Ok(Json(FavoritesResponse {
        jokes: jokes.into_iter().map(Into::into).collect(),
        meta: PageMeta {
            limit: page.limit,
            offset: page.offset,
        },
    }))
}

/// The caller's generation history, newest first.
#[utoipa::path(
    get,
    path = "/api/me/history",
    params(PageQuery),
    responses(
        (status = 200, description = "A page of history entries", body = HistoryResponse),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
    caller: Caller,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user_id = require_user(caller)?;
    let query = page_query(query)?;
    let page = Page::parse(
        query.limit.as_deref(),
        query.offset.as_deref(),
        app_state.config.max_page_limit,
    )?;

    let history = app_state
        .db
        .list_user_history(user_id, page.limit, page.offset)
        .await?;
    Ok(Json(HistoryResponse {
        history: history.into_iter().map(Into::into).collect(),
        meta: PageMeta {
            limit: page.limit,
            offset: page.offset,
        },
    }))
}

//=========================================================================================
// Liveness
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}
