//! In-memory port implementations and request helpers for the HTTP tests.

#![allow(dead_code)]

use api_lib::{
    config::Config,
    web::{build_router, AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jokesmith_core::{
    domain::*,
    ports::{IdentityService, JokeGenerationService, JokeRepository, PortError, PortResult},
    prompts::JokeCategory,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// Repository
//=========================================================================================

#[derive(Default)]
struct Tables {
    jokes: Vec<Joke>,
    categories: Vec<Category>,
    ratings: Vec<Rating>,
    favorites: Vec<Favorite>,
    preferences: Vec<UserPreferences>,
    history: Vec<GenerationHistory>,
}

/// A repository that mirrors the store's constraints: one rating and one favorite
/// per `(joke, user)` pair, ratings and favorites only for existing jokes.
#[derive(Default)]
pub struct InMemoryRepo {
    tables: Mutex<Tables>,
    pub fail_history: AtomicBool,
}

impl InMemoryRepo {
    /// Seeds every built-in category as active plus one retired category.
    pub fn seeded() -> Arc<Self> {
        let repo = Self::default();
        {
            let mut tables = repo.tables.lock().unwrap();
            for category in JokeCategory::ALL {
                tables.categories.push(Category {
                    id: Uuid::new_v4(),
                    name: category.slug().to_string(),
                    description: None,
                    emoji: None,
                    is_active: true,
                    created_at: Utc::now(),
                });
            }
            tables.categories.push(Category {
                id: Uuid::new_v4(),
                name: "retired".to_string(),
                description: None,
                emoji: None,
                is_active: false,
                created_at: Utc::now(),
            });
        }
        Arc::new(repo)
    }

    /// Inserts a joke directly, `minutes_ago` in the past.
    pub fn add_joke(&self, content: &str, category: &str, is_public: bool, minutes_ago: i64) -> Uuid {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        let joke = Joke {
            id: Uuid::new_v4(),
            content: content.to_string(),
            category: category.to_string(),
            author_id: None,
            created_at,
            updated_at: created_at,
            is_ai_generated: false,
            model_used: None,
            prompt_used: None,
            tags: vec![category.to_string()],
            is_public,
            reported_count: 0,
        };
        let id = joke.id;
        self.tables.lock().unwrap().jokes.push(joke);
        id
    }

    pub fn joke_count(&self) -> usize {
        self.tables.lock().unwrap().jokes.len()
    }

    pub fn ratings_for(&self, joke_id: Uuid) -> Vec<Rating> {
        let tables = self.tables.lock().unwrap();
        tables.ratings.iter().filter(|r| r.joke_id == joke_id).cloned().collect()
    }

    pub fn history(&self) -> Vec<GenerationHistory> {
        self.tables.lock().unwrap().history.clone()
    }

    fn stats(tables: &Tables, joke: &Joke, caller: Option<Uuid>) -> JokeStats {
        let ratings: Vec<(Uuid, i16)> = tables
            .ratings
            .iter()
            .filter(|r| r.joke_id == joke.id)
            .map(|r| (r.user_id, r.rating))
            .collect();
        let favorited_by: Vec<Uuid> = tables
            .favorites
            .iter()
            .filter(|f| f.joke_id == joke.id)
            .map(|f| f.user_id)
            .collect();
        JokeStats::from_related(&ratings, &favorited_by, caller)
    }

    fn ensure_joke(tables: &Tables, joke_id: Uuid) -> PortResult<()> {
        if tables.jokes.iter().any(|j| j.id == joke_id) {
            Ok(())
        } else {
            Err(PortError::NotFound(format!("joke {joke_id}")))
        }
    }
}

fn page<T>(items: impl Iterator<Item = T>, limit: u32, offset: u32) -> Vec<T> {
    items.skip(offset as usize).take(limit as usize).collect()
}

#[async_trait]
impl JokeRepository for InMemoryRepo {
    async fn list_jokes(&self, query: JokeQuery) -> PortResult<Vec<JokeWithStats>> {
        let tables = self.tables.lock().unwrap();
        let mut jokes: Vec<&Joke> = tables
            .jokes
            .iter()
            .filter(|j| j.is_public)
            .filter(|j| query.category.as_deref().map_or(true, |c| j.category == c))
            .collect();
        jokes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(jokes.into_iter(), query.limit, query.offset)
            .into_iter()
            .map(|joke| JokeWithStats {
                stats: if query.include_ratings {
                    Self::stats(&tables, joke, query.caller_id)
                } else {
                    JokeStats::default()
                },
                joke: joke.clone(),
            })
            .collect())
    }

    async fn get_joke(&self, id: Uuid, caller_id: Option<Uuid>) -> PortResult<Option<JokeWithStats>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .jokes
            .iter()
            .find(|j| j.id == id && (j.is_public || (caller_id.is_some() && j.author_id == caller_id)))
            .map(|joke| JokeWithStats {
                stats: Self::stats(&tables, joke, caller_id),
                joke: joke.clone(),
            }))
    }

    async fn create_joke(&self, new: NewJoke) -> PortResult<Joke> {
        let now = Utc::now();
        let joke = Joke {
            id: Uuid::new_v4(),
            content: new.content,
            category: new.category,
            author_id: new.author_id,
            created_at: now,
            updated_at: now,
            is_ai_generated: new.is_ai_generated,
            model_used: new.model_used,
            prompt_used: new.prompt_used,
            tags: new.tags,
            is_public: new.is_public,
            reported_count: 0,
        };
        self.tables.lock().unwrap().jokes.push(joke.clone());
        Ok(joke)
    }

    async fn rate_joke(&self, joke_id: Uuid, user_id: Uuid, rating: i16) -> PortResult<Rating> {
        let mut tables = self.tables.lock().unwrap();
        Self::ensure_joke(&tables, joke_id)?;
        if let Some(existing) = tables
            .ratings
            .iter_mut()
            .find(|r| r.joke_id == joke_id && r.user_id == user_id)
        {
            existing.rating = rating;
            return Ok(existing.clone());
        }
        let row = Rating {
            id: Uuid::new_v4(),
            joke_id,
            user_id,
            rating,
            created_at: Utc::now(),
        };
        tables.ratings.push(row.clone());
        Ok(row)
    }

    async fn toggle_favorite(&self, joke_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        Self::ensure_joke(&tables, joke_id)?;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.joke_id == joke_id && f.user_id == user_id));
        if tables.favorites.len() < before {
            return Ok(false);
        }
        tables.favorites.push(Favorite {
            id: Uuid::new_v4(),
            joke_id,
            user_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let tables = self.tables.lock().unwrap();
        let mut categories: Vec<Category> =
            tables.categories.iter().filter(|c| c.is_active).cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_active_category(&self, name: &str) -> PortResult<Option<Category>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .categories
            .iter()
            .find(|c| c.is_active && c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_user_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.preferences.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn upsert_user_preferences(
        &self,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> PortResult<UserPreferences> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let index = match tables.preferences.iter().position(|p| p.user_id == user_id) {
            Some(index) => index,
            None => {
                tables.preferences.push(UserPreferences {
                    id: Uuid::new_v4(),
                    user_id,
                    preferred_categories: Vec::new(),
                    content_filter_level: ContentFilterLevel::default(),
                    max_joke_length: 500,
                    favorite_models: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
                tables.preferences.len() - 1
            }
        };
        let prefs = &mut tables.preferences[index];
        if let Some(v) = update.preferred_categories {
            prefs.preferred_categories = v;
        }
        if let Some(v) = update.content_filter_level {
            prefs.content_filter_level = v;
        }
        if let Some(v) = update.max_joke_length {
            prefs.max_joke_length = v;
        }
        if let Some(v) = update.favorite_models {
            prefs.favorite_models = v;
        }
        prefs.updated_at = now;
        Ok(prefs.clone())
    }

    async fn save_generation_history(
        &self,
        new: NewGenerationHistory,
    ) -> PortResult<GenerationHistory> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(PortError::Store(
                "Failed to save generation history: connection reset".to_string(),
            ));
        }
        let row = GenerationHistory {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            prompt: new.prompt,
            category: new.category,
            model_used: new.model_used,
            generated_joke_id: new.generated_joke_id,
            generation_time_ms: new.generation_time_ms,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().history.push(row.clone());
        Ok(row)
    }

    async fn list_user_favorites(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<Vec<JokeWithStats>> {
        let tables = self.tables.lock().unwrap();
        let mut favorites: Vec<&Favorite> =
            tables.favorites.iter().filter(|f| f.user_id == user_id).collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(favorites.into_iter(), limit, offset)
            .into_iter()
            .filter_map(|f| tables.jokes.iter().find(|j| j.id == f.joke_id))
            .map(|joke| JokeWithStats {
                stats: Self::stats(&tables, joke, Some(user_id)),
                joke: joke.clone(),
            })
            .collect())
    }

    async fn list_user_history(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> PortResult<Vec<HistoryEntry>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<&GenerationHistory> =
            tables.history.iter().filter(|h| h.user_id == user_id).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(rows.into_iter(), limit, offset)
            .into_iter()
            .map(|h| HistoryEntry {
                joke: h.generated_joke_id.and_then(|id| {
                    tables.jokes.iter().find(|j| j.id == id).map(|j| JokeSummary {
                        id: j.id,
                        content: j.content.clone(),
                        category: j.category.clone(),
                    })
                }),
                history: h.clone(),
            })
            .collect())
    }
}

//=========================================================================================
// Gateway and Identity
//=========================================================================================

pub enum GatewayReply {
    Joke(String),
    Unavailable(u16),
}

pub struct StubGateway {
    reply: GatewayReply,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<JokeRequest>>,
}

impl StubGateway {
    pub fn replying(content: &str) -> Arc<Self> {
        Self::with(GatewayReply::Joke(content.to_string()))
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Self::with(GatewayReply::Unavailable(status))
    }

    fn with(reply: GatewayReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JokeGenerationService for StubGateway {
    async fn generate(&self, request: &JokeRequest) -> PortResult<GeneratedJoke> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.reply {
            GatewayReply::Joke(content) => Ok(GeneratedJoke {
                content: content.clone(),
                model_used: request.model.clone(),
                elapsed_ms: 42,
            }),
            GatewayReply::Unavailable(status) => Err(PortError::Gateway {
                status: Some(*status),
                message: "upstream unavailable".to_string(),
            }),
        }
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "google/gemini-2.5-flash".to_string(),
            name: "Gemini 2.5 Flash".to_string(),
            description: None,
            context_length: Some(1_048_576),
        }]
    }
}

/// Maps fixed tokens to user ids; every other token is rejected.
#[derive(Default)]
pub struct StubIdentity {
    tokens: HashMap<String, Uuid>,
}

impl StubIdentity {
    pub fn with_user(token: &str, user_id: Uuid) -> Arc<Self> {
        let mut tokens = HashMap::new();
        tokens.insert(token.to_string(), user_id);
        Arc::new(Self { tokens })
    }
}

#[async_trait]
impl IdentityService for StubIdentity {
    async fn resolve_caller(&self, token: &str) -> PortResult<Option<Uuid>> {
        Ok(self.tokens.get(token).copied())
    }
}

/// An identity provider that is down for every token.
pub struct FailingIdentity;

#[async_trait]
impl IdentityService for FailingIdentity {
    async fn resolve_caller(&self, _token: &str) -> PortResult<Option<Uuid>> {
        Err(PortError::Unexpected(
            "Identity provider returned 502 Bad Gateway".to_string(),
        ))
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub const TOKEN: &str = "valid-session";

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepo>,
    pub gateway: Option<Arc<StubGateway>>,
    pub user_id: Uuid,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/jokes_test".to_string()),
        "AUTH_URL" => Some("http://identity.test/auth/v1".to_string()),
        "AUTH_API_KEY" => Some("test-key".to_string()),
        "MAX_PAGE_LIMIT" => Some("50".to_string()),
        _ => None,
    })
    .expect("test configuration is valid")
}

impl TestApp {
    pub fn new(gateway: Option<Arc<StubGateway>>) -> Self {
        let user_id = Uuid::new_v4();
        Self::build(gateway, StubIdentity::with_user(TOKEN, user_id), user_id)
    }

    /// An app whose identity provider fails every lookup.
    pub fn with_failing_identity(gateway: Option<Arc<StubGateway>>) -> Self {
        Self::build(gateway, Arc::new(FailingIdentity), Uuid::new_v4())
    }

    fn build(
        gateway: Option<Arc<StubGateway>>,
        identity: Arc<dyn IdentityService>,
        user_id: Uuid,
    ) -> Self {
        let repo = InMemoryRepo::seeded();
        let state = Arc::new(AppState {
            db: repo.clone(),
            identity,
            gateway: gateway
                .clone()
                .map(|g| g as Arc<dyn JokeGenerationService>),
            config: Arc::new(test_config()),
        });
        let router = build_router(state).expect("router builds");
        Self {
            router,
            repo,
            gateway,
            user_id,
        }
    }

    pub fn with_gateway_reply(content: &str) -> Self {
        Self::new(Some(StubGateway::replying(content)))
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }
}
