//! services/api/src/web/models.rs
//!
//! Request and response payloads for the REST API, plus their conversions from
//! the core domain types.

use chrono::{DateTime, Utc};
use jokesmith_core::domain::{
    Category, HistoryEntry, Joke, JokeSummary, JokeWithStats, ModelInfo, Rating, UserPreferences,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Requests
//=========================================================================================

/// Body of `POST /api/jokes/generate`. Every field is optional at the wire level so
/// that a missing category is reported as a validation error, not a decode error.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateJokeRequest {
    pub category: Option<String>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    /// One of `low`, `medium`, `high`. Defaults to `medium`.
    pub content_filter: Option<String>,
    /// In `[0, 1]`. Defaults to `0.7`.
    pub creativity: Option<f32>,
    /// `en` or `ru`. Defaults to `en`.
    pub language: Option<String>,
}

/// Raw pagination query. Values are parsed by the handlers so bad input yields `{error}`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub category: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateJokeRequest {
    pub rating: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    pub preferred_categories: Option<Vec<String>>,
    pub content_filter_level: Option<String>,
    pub max_joke_length: Option<i32>,
    pub favorite_models: Option<Vec<String>>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct JokeResponse {
    pub id: Uuid,
    pub content: String,
    pub category: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_ai_generated: bool,
    pub model_used: Option<String>,
    pub prompt_used: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub reported_count: i32,
    /// Absent when the joke has no ratings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub total_ratings: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i16>,
    pub is_favorited: bool,
}

impl From<Joke> for JokeResponse {
    fn from(joke: Joke) -> Self {
        JokeWithStats {
            joke,
            stats: Default::default(),
        }
        .into()
    }
}

impl From<JokeWithStats> for JokeResponse {
    fn from(JokeWithStats { joke, stats }: JokeWithStats) -> Self {
        Self {
            id: joke.id,
            content: joke.content,
            category: joke.category,
            author_id: joke.author_id,
            created_at: joke.created_at,
            updated_at: joke.updated_at,
            is_ai_generated: joke.is_ai_generated,
            model_used: joke.model_used,
            prompt_used: joke.prompt_used,
            tags: joke.tags,
            is_public: joke.is_public,
            reported_count: joke.reported_count,
            average_rating: stats.average_rating,
            total_ratings: stats.total_ratings,
            user_rating: stats.user_rating,
            is_favorited: stats.is_favorited,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateJokeResponse {
    pub joke: JokeResponse,
    pub generation_time_ms: i64,
    pub model_used: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMeta {
    pub limit: u32,
    pub offset: u32,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListJokesResponse {
    pub jokes: Vec<JokeResponse>,
    pub meta: ListMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingResponse {
    pub id: Uuid,
    pub joke_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponse {
    fn from(r: Rating) -> Self {
        Self {
            id: r.id,
            joke_id: r.joke_id,
            user_id: r.user_id,
            rating: r.rating,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteResponse {
    pub favorited: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            emoji: c.emoji,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreferencesResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_categories: Vec<String>,
    pub content_filter_level: String,
    pub max_joke_length: i32,
    pub favorite_models: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserPreferences> for PreferencesResponse {
    fn from(p: UserPreferences) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            preferred_categories: p.preferred_categories,
            content_filter_level: p.content_filter_level.to_string(),
            max_joke_length: p.max_joke_length,
            favorite_models: p.favorite_models,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JokeSummaryResponse {
    pub id: Uuid,
    pub content: String,
    pub category: String,
}

impl From<JokeSummary> for JokeSummaryResponse {
    fn from(s: JokeSummary) -> Self {
        Self {
            id: s.id,
            content: s.content,
            category: s.category,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub category: String,
    pub model_used: String,
    pub generated_joke_id: Option<Uuid>,
    pub generation_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub joke: Option<JokeSummaryResponse>,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(HistoryEntry { history, joke }: HistoryEntry) -> Self {
        Self {
            id: history.id,
            user_id: history.user_id,
            prompt: history.prompt,
            category: history.category,
            model_used: history.model_used,
            generated_joke_id: history.generated_joke_id,
            generation_time_ms: history.generation_time_ms,
            created_at: history.created_at,
            joke: joke.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PageMeta {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesResponse {
    pub jokes: Vec<JokeResponse>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntryResponse>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub context_length: Option<u64>,
}

impl From<ModelInfo> for ModelResponse {
    fn from(m: ModelInfo) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            context_length: m.context_length,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<ModelResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
