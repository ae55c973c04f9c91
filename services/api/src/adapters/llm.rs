//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the joke-writing LLM gateway (OpenRouter,
//! spoken to through its OpenAI-compatible API). It implements the
//! `JokeGenerationService` port from the `core` crate.

use async_openai::types::chat::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use jokesmith_core::{
    domain::{GeneratedJoke, JokeRequest, ModelInfo},
    ports::{JokeGenerationService, PortError, PortResult},
    prompts::{build_system_prompt, resolve_user_prompt},
    sampling::SamplingParams,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    StatusCode,
};
use serde::Deserialize;
use std::time::Instant;
use tracing::{info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `JokeGenerationService` against an OpenAI-compatible gateway.
///
/// Requests are typed with `async_openai` builders and sent through a plain `reqwest`
/// client, so every generation is exactly one HTTP attempt.
#[derive(Clone)]
pub struct OpenRouterJokeAdapter {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenRouterJokeAdapter {
    /// Creates a new `OpenRouterJokeAdapter`.
    ///
    /// `app_url` and `app_title` are sent as OpenRouter attribution headers on every call.
    pub fn new(api_key: &str, api_base: &str, app_url: &str, app_title: &str) -> PortResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in [("http-referer", app_url), ("x-title", app_title)] {
            let value = HeaderValue::from_str(value).map_err(|e| {
                PortError::Unexpected(format!("Invalid value for header {}: {}", name, e))
            })?;
            headers.insert(HeaderName::from_static(name), value);
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Maps a non-success reply onto a gateway error. The provider's own error message
/// is used when the body carries one, the status reason otherwise.
fn gateway_status_error(status: StatusCode, body: &str) -> PortError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected status")
                .to_string()
        });
    PortError::Gateway {
        status: Some(status.as_u16()),
        message,
    }
}

/// Turns the first choice of a completion into the joke text and the model that wrote it.
fn finish_completion(
    content: Option<String>,
    response_model: String,
    requested_model: &str,
) -> PortResult<(String, String)> {
    let content = content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| PortError::Gateway {
            status: None,
            message: "Invalid response format from OpenRouter API".to_string(),
        })?;
    let model_used = if response_model.trim().is_empty() {
        requested_model.to_string()
    } else {
        response_model
    };
    Ok((content, model_used))
}

//=========================================================================================
// Chat Completion Payloads
//=========================================================================================

#[derive(Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

//=========================================================================================
// Model Catalog Payloads
//=========================================================================================

#[derive(Deserialize)]
struct ModelsEnvelope {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    name: Option<String>,
    description: Option<String>,
    context_length: Option<u64>,
}

impl ModelEntry {
    fn to_domain(self) -> ModelInfo {
        ModelInfo {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            description: self.description,
            context_length: self.context_length,
        }
    }
}

//=========================================================================================
// `JokeGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl JokeGenerationService for OpenRouterJokeAdapter {
    /// Builds the persona prompt, calls the chat-completion endpoint once, and times the call.
    async fn generate(&self, request: &JokeRequest) -> PortResult<GeneratedJoke> {
        let system_prompt =
            build_system_prompt(&request.category, request.content_filter, request.language);
        let user_prompt = resolve_user_prompt(&request.prompt, &request.category, request.language);
        let sampling = SamplingParams::from_creativity(request.creativity);

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(sampling.temperature)
            .top_p(sampling.top_p)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let start = Instant::now();
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| PortError::Gateway {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PortError::Gateway {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        let elapsed_ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

        if !status.is_success() {
            warn!(status = status.as_u16(), elapsed_ms, "OpenRouter call failed");
            return Err(gateway_status_error(status, &body));
        }

        let envelope: CompletionEnvelope =
            serde_json::from_str(&body).map_err(|_| PortError::Gateway {
                status: None,
                message: "Invalid response format from OpenRouter API".to_string(),
            })?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        let (content, model_used) = finish_completion(content, envelope.model, &request.model)?;

        info!(model = %model_used, elapsed_ms, "Joke generated");
        Ok(GeneratedJoke {
            content,
            model_used,
            elapsed_ms,
        })
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        let result = async {
            let response = self
                .http
                .get(format!("{}/models", self.api_base))
                .bearer_auth(&self.api_key)
                .send()
                .await?
                .error_for_status()?;
            response.json::<ModelsEnvelope>().await
        }
        .await;

        match result {
            Ok(envelope) => envelope.data.into_iter().map(ModelEntry::to_domain).collect(),
            Err(e) => {
                warn!("Failed to fetch models: {}", e);
                Vec::new()
            }
        }
    }
}
