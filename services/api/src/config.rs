//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

pub const DEFAULT_LLM_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub run_migrations: bool,
    pub log_level: Level,
    /// `None` leaves the service up but makes generation fail with a configuration error.
    pub openrouter_api_key: Option<String>,
    pub llm_api_base: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub app_url: String,
    pub app_title: String,
    pub auth_url: String,
    pub auth_api_key: String,
    pub cors_origin: String,
    pub max_page_limit: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_var(&lookup, "BIND_ADDRESS", "0.0.0.0:3000")?;
        let database_url = required("DATABASE_URL")?;
        let run_migrations = parse_var(&lookup, "RUN_MIGRATIONS", "true")?;

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- LLM Gateway ---
        // An empty key counts as not provisioned.
        let openrouter_api_key = lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty());
        let llm_api_base = or_default("LLM_API_BASE", DEFAULT_LLM_API_BASE);
        let default_model = or_default("DEFAULT_MODEL", DEFAULT_MODEL);
        let max_tokens = parse_var(&lookup, "MAX_TOKENS", "500")?;
        let app_url = or_default("APP_URL", "http://localhost:3000");
        let app_title = or_default("APP_TITLE", "Joke AI Platform");

        // --- Identity Provider ---
        let auth_url = required("AUTH_URL")?;
        let auth_api_key = required("AUTH_API_KEY")?;

        // --- HTTP Surface ---
        let cors_origin = or_default("CORS_ORIGIN", "http://localhost:3000");
        // Credentialed CORS cannot echo a wildcard origin.
        if cors_origin.trim() == "*" {
            return Err(ConfigError::InvalidValue(
                "CORS_ORIGIN".to_string(),
                "wildcard origin cannot be combined with credentials".to_string(),
            ));
        }
        let max_page_limit: u32 = parse_var(&lookup, "MAX_PAGE_LIMIT", "100")?;
        if max_page_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_PAGE_LIMIT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            run_migrations,
            log_level,
            openrouter_api_key,
            llm_api_base,
            default_model,
            max_tokens,
            app_url,
            app_title,
            auth_url,
            auth_api_key,
            cors_origin,
            max_page_limit,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
