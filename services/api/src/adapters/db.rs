//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `JokeRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL store using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jokesmith_core::domain::{
    Category, GenerationHistory, HistoryEntry, Joke, JokeQuery, JokeStats, JokeSummary,
    JokeWithStats, NewGenerationHistory, NewJoke, PreferencesUpdate, Rating, UserPreferences,
};
use jokesmith_core::ports::{JokeRepository, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const JOKE_COLUMNS: &str = "j.id, j.content, j.category, j.author_id, j.created_at, j.updated_at, \
     j.is_ai_generated, j.model_used, j.prompt_used, j.tags, j.is_public, j.reported_count";

const PREFERENCE_COLUMNS: &str = "id, user_id, preferred_categories, content_filter_level, \
     max_joke_length, favorite_models, created_at, updated_at";

const FOREIGN_KEY_VIOLATION: &str = "23503";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `JokeRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Loads ratings (and the caller's favorites) for `joke_ids` and folds them into stats.
    async fn load_stats(
        &self,
        joke_ids: &[Uuid],
        caller: Option<Uuid>,
    ) -> PortResult<HashMap<Uuid, JokeStats>> {
        if joke_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ratings = sqlx::query_as::<_, RatingRow>(
            "SELECT joke_id, user_id, rating FROM joke_ratings WHERE joke_id = ANY($1)",
        )
        .bind(joke_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("fetch joke ratings"))?;

        let favorites = match caller {
            Some(caller) => sqlx::query_as::<_, FavoriteRow>(
                "SELECT joke_id, user_id FROM joke_favorites WHERE joke_id = ANY($1) AND user_id = $2",
            )
            .bind(joke_ids)
            .bind(caller)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("fetch joke favorites"))?,
            None => Vec::new(),
        };

        let mut ratings_by_joke: HashMap<Uuid, Vec<(Uuid, i16)>> = HashMap::new();
        for row in ratings {
            ratings_by_joke
                .entry(row.joke_id)
                .or_default()
                .push((row.user_id, row.rating));
        }
        let mut favorites_by_joke: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in favorites {
            favorites_by_joke.entry(row.joke_id).or_default().push(row.user_id);
        }

        Ok(joke_ids
            .iter()
            .map(|id| {
                let ratings = ratings_by_joke.get(id).map(Vec::as_slice).unwrap_or_default();
                let favorited_by = favorites_by_joke.get(id).map(Vec::as_slice).unwrap_or_default();
                (*id, JokeStats::from_related(ratings, favorited_by, caller))
            })
            .collect())
    }

    async fn with_stats(
        &self,
        records: Vec<JokeRecord>,
        caller: Option<Uuid>,
    ) -> PortResult<Vec<JokeWithStats>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut stats = self.load_stats(&ids, caller).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let stats = stats.remove(&record.id).unwrap_or_default();
                JokeWithStats {
                    joke: record.to_domain(),
                    stats,
                }
            })
            .collect())
    }
}

/// Wraps a `sqlx` error into a store error carrying the upstream message.
fn store_error(action: &'static str) -> impl Fn(sqlx::Error) -> PortError {
    move |e| PortError::Store(format!("Failed to {}: {}", action, e))
}

/// Like [`store_error`], but reports a missing joke when a foreign key rejects the write.
fn joke_write_error(action: &'static str, joke_id: Uuid) -> impl Fn(sqlx::Error) -> PortError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            PortError::NotFound(format!("Joke {} not found", joke_id))
        }
        _ => PortError::Store(format!("Failed to {}: {}", action, e)),
    }
}

fn page_bounds(limit: u32, offset: u32) -> (i64, i64) {
    (i64::from(limit), i64::from(offset))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct JokeRecord {
    id: Uuid,
    content: String,
    category: String,
    author_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_ai_generated: bool,
    model_used: Option<String>,
    prompt_used: Option<String>,
    tags: Vec<String>,
    is_public: bool,
    reported_count: i32,
}
impl JokeRecord {
    fn to_domain(self) -> Joke {
        Joke {
            id: self.id,
            content: self.content,
            category: self.category,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_ai_generated: self.is_ai_generated,
            model_used: self.model_used,
            prompt_used: self.prompt_used,
            tags: self.tags,
            is_public: self.is_public,
            reported_count: self.reported_count,
        }
    }
}

#[derive(FromRow)]
struct RatingRow {
    joke_id: Uuid,
    user_id: Uuid,
    rating: i16,
}

#[derive(FromRow)]
struct FavoriteRow {
    joke_id: Uuid,
    user_id: Uuid,
}

#[derive(FromRow)]
struct RatingRecord {
    id: Uuid,
    joke_id: Uuid,
    user_id: Uuid,
    rating: i16,
    created_at: DateTime<Utc>,
}
impl RatingRecord {
    fn to_domain(self) -> Rating {
        Rating {
            id: self.id,
            joke_id: self.joke_id,
            user_id: self.user_id,
            rating: self.rating,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    emoji: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            description: self.description,
            emoji: self.emoji,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PreferencesRecord {
    id: Uuid,
    user_id: Uuid,
    preferred_categories: Vec<String>,
    content_filter_level: String,
    max_joke_length: i32,
    favorite_models: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl PreferencesRecord {
    fn to_domain(self) -> UserPreferences {
        UserPreferences {
            id: self.id,
            user_id: self.user_id,
            preferred_categories: self.preferred_categories,
            // The column carries a CHECK constraint; anything else reads as the default.
            content_filter_level: self.content_filter_level.parse().unwrap_or_default(),
            max_joke_length: self.max_joke_length,
            favorite_models: self.favorite_models,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct HistoryRecord {
    id: Uuid,
    user_id: Uuid,
    prompt: String,
    category: String,
    model_used: String,
    generated_joke_id: Option<Uuid>,
    generation_time_ms: Option<i64>,
    created_at: DateTime<Utc>,
}
impl HistoryRecord {
    fn to_domain(self) -> GenerationHistory {
        GenerationHistory {
            id: self.id,
            user_id: self.user_id,
            prompt: self.prompt,
            category: self.category,
            model_used: self.model_used,
            generated_joke_id: self.generated_joke_id,
            generation_time_ms: self.generation_time_ms,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct HistoryWithJokeRecord {
    #[sqlx(flatten)]
    history: HistoryRecord,
    joke_id: Option<Uuid>,
    joke_content: Option<String>,
    joke_category: Option<String>,
}
impl HistoryWithJokeRecord {
    fn to_domain(self) -> HistoryEntry {
        let joke = match (self.joke_id, self.joke_content, self.joke_category) {
            (Some(id), Some(content), Some(category)) => Some(JokeSummary {
                id,
                content,
                category,
            }),
            _ => None,
        };
        HistoryEntry {
            history: self.history.to_domain(),
            joke,
        }
    }
}

//=========================================================================================
// `JokeRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl JokeRepository for DbAdapter {
    async fn list_jokes(&self, query: JokeQuery) -> PortResult<Vec<JokeWithStats>> {
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let sql = format!(
            "SELECT {JOKE_COLUMNS} FROM jokes j \
             WHERE j.is_public = TRUE AND ($1::text IS NULL OR j.category = $1) \
             ORDER BY j.created_at DESC LIMIT $2 OFFSET $3"
        );
        let records = sqlx::query_as::<_, JokeRecord>(&sql)
            .bind(query.category.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("fetch jokes"))?;

        if query.include_ratings {
            self.with_stats(records, query.caller_id).await
        } else {
            Ok(records
                .into_iter()
                .map(|record| JokeWithStats {
                    joke: record.to_domain(),
                    stats: JokeStats::default(),
                })
                .collect())
        }
    }

    async fn get_joke(
        &self,
        id: Uuid,
        caller_id: Option<Uuid>,
    ) -> PortResult<Option<JokeWithStats>> {
        // Private jokes are only visible to their author.
        let sql = format!(
            "SELECT {JOKE_COLUMNS} FROM jokes j \
             WHERE j.id = $1 AND (j.is_public = TRUE OR j.author_id = $2)"
        );
        let record = sqlx::query_as::<_, JokeRecord>(&sql)
            .bind(id)
            .bind(caller_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("fetch joke"))?;

        match record {
            Some(record) => Ok(self.with_stats(vec![record], caller_id).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_joke(&self, joke: NewJoke) -> PortResult<Joke> {
        let sql = format!(
            "INSERT INTO jokes AS j (content, category, author_id, is_ai_generated, model_used, \
             prompt_used, tags, is_public) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {JOKE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, JokeRecord>(&sql)
            .bind(&joke.content)
            .bind(&joke.category)
            .bind(joke.author_id)
            .bind(joke.is_ai_generated)
            .bind(&joke.model_used)
            .bind(&joke.prompt_used)
            .bind(&joke.tags)
            .bind(joke.is_public)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error("create joke"))?;
        Ok(record.to_domain())
    }

    async fn rate_joke(&self, joke_id: Uuid, user_id: Uuid, rating: i16) -> PortResult<Rating> {
        let record = sqlx::query_as::<_, RatingRecord>(
            "INSERT INTO joke_ratings (joke_id, user_id, rating) VALUES ($1, $2, $3) \
             ON CONFLICT (joke_id, user_id) DO UPDATE SET rating = EXCLUDED.rating, created_at = now() \
             RETURNING id, joke_id, user_id, rating, created_at",
        )
        .bind(joke_id)
        .bind(user_id)
        .bind(rating)
        .fetch_one(&self.pool)
        .await
        .map_err(joke_write_error("rate joke", joke_id))?;
        Ok(record.to_domain())
    }

    async fn toggle_favorite(&self, joke_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        // Read-then-write: two concurrent toggles by the same user can race. The
        // (joke_id, user_id) unique constraint keeps the table itself consistent.
        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM joke_favorites WHERE joke_id = $1 AND user_id = $2",
        )
        .bind(joke_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("fetch favorite"))?;

        match existing {
            Some(id) => {
                sqlx::query("DELETE FROM joke_favorites WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(store_error("remove favorite"))?;
                Ok(false)
            }
            None => {
                sqlx::query("INSERT INTO joke_favorites (joke_id, user_id) VALUES ($1, $2)")
                    .bind(joke_id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
                    .map_err(joke_write_error("add favorite", joke_id))?;
                Ok(true)
            }
        }
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, description, emoji, is_active, created_at \
             FROM joke_categories WHERE is_active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("fetch categories"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_active_category(&self, name: &str) -> PortResult<Option<Category>> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, description, emoji, is_active, created_at \
             FROM joke_categories WHERE is_active = TRUE AND lower(name) = lower($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("fetch category"))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn get_user_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>> {
        let sql = format!("SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = $1");
        let record = sqlx::query_as::<_, PreferencesRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("fetch user preferences"))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn upsert_user_preferences(
        &self,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> PortResult<UserPreferences> {
        let sql = format!(
            "INSERT INTO user_preferences \
             (user_id, preferred_categories, content_filter_level, max_joke_length, favorite_models) \
             VALUES ($1, COALESCE($2::text[], '{{}}'), COALESCE($3::text, 'medium'), \
                     COALESCE($4::int, 500), COALESCE($5::text[], '{{}}')) \
             ON CONFLICT (user_id) DO UPDATE SET \
                preferred_categories = COALESCE($2::text[], user_preferences.preferred_categories), \
                content_filter_level = COALESCE($3::text, user_preferences.content_filter_level), \
                max_joke_length = COALESCE($4::int, user_preferences.max_joke_length), \
                favorite_models = COALESCE($5::text[], user_preferences.favorite_models), \
                updated_at = now() \
             RETURNING {PREFERENCE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, PreferencesRecord>(&sql)
            .bind(user_id)
            .bind(update.preferred_categories)
            .bind(update.content_filter_level.map(|level| level.as_str()))
            .bind(update.max_joke_length)
            .bind(update.favorite_models)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error("update user preferences"))?;
        Ok(record.to_domain())
    }

    async fn save_generation_history(
        &self,
        history: NewGenerationHistory,
    ) -> PortResult<GenerationHistory> {
        let record = sqlx::query_as::<_, HistoryRecord>(
            "INSERT INTO generation_history \
             (user_id, prompt, category, model_used, generated_joke_id, generation_time_ms) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, prompt, category, model_used, generated_joke_id, \
                       generation_time_ms, created_at",
        )
        .bind(history.user_id)
        .bind(&history.prompt)
        .bind(&history.category)
        .bind(&history.model_used)
        .bind(history.generated_joke_id)
        .bind(history.generation_time_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("save generation history"))?;
        Ok(record.to_domain())
    }

    async fn list_user_favorites(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<Vec<JokeWithStats>> {
        let (limit, offset) = page_bounds(limit, offset);
        let sql = format!(
            "SELECT {JOKE_COLUMNS} FROM joke_favorites f JOIN jokes j ON j.id = f.joke_id \
             WHERE f.user_id = $1 ORDER BY f.created_at DESC LIMIT $2 OFFSET $3"
        );
        let records = sqlx::query_as::<_, JokeRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("fetch user favorites"))?;

        let mut jokes = self.with_stats(records, Some(user_id)).await?;
        for joke in &mut jokes {
            joke.stats.is_favorited = true;
        }
        Ok(jokes)
    }

    async fn list_user_history(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<Vec<HistoryEntry>> {
        let (limit, offset) = page_bounds(limit, offset);
        let records = sqlx::query_as::<_, HistoryWithJokeRecord>(
            "SELECT h.id, h.user_id, h.prompt, h.category, h.model_used, h.generated_joke_id, \
                    h.generation_time_ms, h.created_at, \
                    j.id AS joke_id, j.content AS joke_content, j.category AS joke_category \
             FROM generation_history h LEFT JOIN jokes j ON j.id = h.generated_joke_id \
             WHERE h.user_id = $1 ORDER BY h.created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("fetch generation history"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
