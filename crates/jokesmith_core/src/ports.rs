//! crates/jokesmith_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the relational store, the LLM gateway and the identity provider.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Category, GeneratedJoke, GenerationHistory, HistoryEntry, Joke, JokeQuery, JokeRequest,
    JokeWithStats, ModelInfo, NewGenerationHistory, NewJoke, PreferencesUpdate, Rating,
    UserPreferences,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backing store rejected or failed an operation.
    #[error("Store error: {0}")]
    Store(String),
    /// The LLM gateway failed: transport error, non-OK status, or malformed response.
    #[error("{}", gateway_message(.status, .message))]
    Gateway { status: Option<u16>, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

fn gateway_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("LLM gateway error ({status}): {message}"),
        None => format!("LLM gateway error: {message}"),
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait JokeRepository: Send + Sync {
    // --- Jokes ---
    async fn list_jokes(&self, query: JokeQuery) -> PortResult<Vec<JokeWithStats>>;

    async fn get_joke(&self, id: Uuid, caller_id: Option<Uuid>)
        -> PortResult<Option<JokeWithStats>>;

    async fn create_joke(&self, joke: NewJoke) -> PortResult<Joke>;

    // --- Ratings and Favorites ---
    /// Inserts or overwrites the single rating for `(joke_id, user_id)`.
    async fn rate_joke(&self, joke_id: Uuid, user_id: Uuid, rating: i16) -> PortResult<Rating>;

    /// Returns `true` when the joke is now favorited, `false` when it was removed.
    async fn toggle_favorite(&self, joke_id: Uuid, user_id: Uuid) -> PortResult<bool>;

    // --- Categories ---
    async fn list_categories(&self) -> PortResult<Vec<Category>>;

    /// Case-insensitive lookup among active categories.
    async fn find_active_category(&self, name: &str) -> PortResult<Option<Category>>;

    // --- Preferences ---
    async fn get_user_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>>;

    async fn upsert_user_preferences(
        &self,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> PortResult<UserPreferences>;

    // --- History and per-user listings ---
    async fn save_generation_history(
        &self,
        history: NewGenerationHistory,
    ) -> PortResult<GenerationHistory>;

    async fn list_user_favorites(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<Vec<JokeWithStats>>;

    async fn list_user_history(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait JokeGenerationService: Send + Sync {
    /// Produces one joke for the request, timing the upstream call.
    async fn generate(&self, request: &JokeRequest) -> PortResult<GeneratedJoke>;

    /// Best-effort model catalog. Never fails; returns an empty list instead.
    async fn list_models(&self) -> Vec<ModelInfo>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolves a session token to a user id. `Ok(None)` means the token is not valid.
    async fn resolve_caller(&self, token: &str) -> PortResult<Option<Uuid>>;
}
