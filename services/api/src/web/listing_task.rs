//! services/api/src/web/listing_task.rs
//!
//! Read paths: pagination parsing and the public joke listing.

use crate::{
    error::ApiError,
    web::{
        models::{ListJokesResponse, ListMeta, PageQuery},
        state::{AppState, Caller},
    },
};
use jokesmith_core::domain::JokeQuery;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// An effective `limit`/`offset` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Parses raw query values. Missing values take their defaults and `limit`
    /// is capped at `max_limit`.
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
        max_limit: u32,
    ) -> Result<Self, ApiError> {
        let limit = parse_count("limit", limit)?.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = parse_count("offset", offset)?.unwrap_or(0);
        Ok(Self {
            limit: limit.min(max_limit),
            offset,
        })
    }
}

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<u32>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
            ApiError::Validation(format!("{name} must be a non-negative integer"))
        }),
    }
}

/// Lists public jokes, newest first, enriched for the optional caller.
pub async fn listing_process(
    app_state: Arc<AppState>,
    caller: Caller,
    query: PageQuery,
) -> Result<ListJokesResponse, ApiError> {
    let page = Page::parse(
        query.limit.as_deref(),
        query.offset.as_deref(),
        app_state.config.max_page_limit,
    )?;
    let category = query
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    debug!(?page, ?category, "Listing jokes");
    let jokes = app_state
        .db
        .list_jokes(JokeQuery {
            category: category.clone(),
            limit: page.limit,
            offset: page.offset,
            caller_id: caller.user_id(),
            include_ratings: true,
        })
        .await?;

    Ok(ListJokesResponse {
        jokes: jokes.into_iter().map(Into::into).collect(),
        meta: ListMeta {
            limit: page.limit,
            offset: page.offset,
            category,
        },
    })
}
