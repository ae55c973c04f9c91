//! services/api/src/web/generation_task.rs
//!
//! The generation workflow behind `POST /api/jokes/generate`: validate the request,
//! check the caller, call the LLM gateway, then persist the joke and its history row.

use crate::{
    error::ApiError,
    web::{
        models::{GenerateJokeRequest, GenerateJokeResponse},
        state::{AppState, Caller},
    },
};
use jokesmith_core::{
    domain::{ContentFilterLevel, JokeRequest, Language, NewGenerationHistory, NewJoke},
    sampling::DEFAULT_CREATIVITY,
};
use std::sync::Arc;
use tracing::{info, warn};

/// A generation request after validation, with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedGeneration {
    pub category: String,
    /// The caller's literal prompt; `None` when absent or blank.
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub content_filter: ContentFilterLevel,
    pub creativity: f32,
    pub language: Language,
}

/// The prompt recorded in the caller's history: the literal prompt, or a stand-in naming the category.
pub fn history_prompt(prompt: Option<&str>, category: &str) -> String {
    match prompt {
        Some(prompt) => prompt.to_string(),
        None => format!("Generate a {category} joke"),
    }
}

/// Checks the request shape. Runs before authentication so malformed requests
/// are rejected as 400 even for anonymous callers.
pub fn validate_request(request: GenerateJokeRequest) -> Result<ValidatedGeneration, ApiError> {
    let category = request
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("Category is required".to_string()))?;

    let content_filter = match request.content_filter.as_deref() {
        Some(raw) => raw.parse::<ContentFilterLevel>().map_err(ApiError::Validation)?,
        None => ContentFilterLevel::default(),
    };
    let language = match request.language.as_deref() {
        Some(raw) => raw.parse::<Language>().map_err(ApiError::Validation)?,
        None => Language::default(),
    };

    let creativity = request.creativity.unwrap_or(DEFAULT_CREATIVITY);
    if !(0.0..=1.0).contains(&creativity) {
        return Err(ApiError::Validation(
            "Creativity must be between 0 and 1".to_string(),
        ));
    }

    Ok(ValidatedGeneration {
        category,
        prompt: request
            .prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        model: request
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        content_filter,
        creativity,
        language,
    })
}

/// Runs one generation end to end.
///
/// The joke and history inserts are two separate writes. When the history write
/// fails the joke stays stored and the request reports the store error.
pub async fn generation_process(
    app_state: Arc<AppState>,
    caller: Caller,
    request: GenerateJokeRequest,
) -> Result<GenerateJokeResponse, ApiError> {
    let validated = validate_request(request)?;

    let user_id = caller.user_id().ok_or(ApiError::Authentication)?;

    let gateway = app_state.gateway.clone().ok_or_else(|| {
        ApiError::Configuration("OpenRouter API key not configured".to_string())
    })?;

    let category = app_state
        .db
        .find_active_category(&validated.category)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!("Unknown category: {}", validated.category))
        })?;

    let joke_request = JokeRequest {
        prompt: validated.prompt.clone().unwrap_or_default(),
        category: category.name.clone(),
        model: validated
            .model
            .clone()
            .unwrap_or_else(|| app_state.config.default_model.clone()),
        max_tokens: app_state.config.max_tokens,
        content_filter: validated.content_filter,
        creativity: validated.creativity,
        language: validated.language,
    };

    info!(
        user_id = %user_id,
        category = %joke_request.category,
        model = %joke_request.model,
        "Requesting joke from the gateway"
    );
    let generated = gateway.generate(&joke_request).await?;

    let joke = app_state
        .db
        .create_joke(NewJoke {
            content: generated.content,
            category: category.name.clone(),
            author_id: Some(user_id),
            is_ai_generated: true,
            model_used: Some(generated.model_used.clone()),
            prompt_used: validated.prompt.clone(),
            tags: vec![category.name.clone()],
            is_public: true,
        })
        .await?;

    let history = NewGenerationHistory {
        user_id,
        prompt: history_prompt(validated.prompt.as_deref(), &category.name),
        category: category.name,
        model_used: generated.model_used.clone(),
        generated_joke_id: Some(joke.id),
        generation_time_ms: Some(generated.elapsed_ms),
    };
    if let Err(e) = app_state.db.save_generation_history(history).await {
        warn!(joke_id = %joke.id, "Joke stored without a history entry: {}", e);
        return Err(e.into());
    }

    Ok(GenerateJokeResponse {
        joke: joke.into(),
        generation_time_ms: generated.elapsed_ms,
        model_used: generated.model_used,
    })
}
