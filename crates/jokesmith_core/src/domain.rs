//! crates/jokesmith_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lowest rating a user can give a joke.
pub const MIN_RATING: i16 = 1;
/// Highest rating a user can give a joke.
pub const MAX_RATING: i16 = 5;

//=========================================================================================
// Enumerations
//=========================================================================================

/// How strict the content guidance handed to the LLM is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFilterLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ContentFilterLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ContentFilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentFilterLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown content filter level '{other}'")),
        }
    }
}

/// Output language for generated jokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::En, Self::Ru];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

//=========================================================================================
// Stored Entities
//=========================================================================================

/// A joke row as stored. Derived read-time fields live in [`JokeStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct Joke {
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
}

/// The caller-supplied fields of a new joke. The store assigns everything else.
#[derive(Debug, Clone)]
pub struct NewJoke {
    pub content: String,
    pub category: String,
    pub author_id: Option<Uuid>,
    pub is_ai_generated: bool,
    pub model_used: Option<String>,
    pub prompt_used: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A single user's rating of a joke. At most one per (joke, user).
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub joke_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    pub id: Uuid,
    pub joke_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPreferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_categories: Vec<String>,
    pub content_filter_level: ContentFilterLevel,
    pub max_joke_length: i32,
    pub favorite_models: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial preferences update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub preferred_categories: Option<Vec<String>>,
    pub content_filter_level: Option<ContentFilterLevel>,
    pub max_joke_length: Option<i32>,
    pub favorite_models: Option<Vec<String>>,
}

/// One append-only record of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub category: String,
    pub model_used: String,
    pub generated_joke_id: Option<Uuid>,
    pub generation_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGenerationHistory {
    pub user_id: Uuid,
    pub prompt: String,
    pub category: String,
    pub model_used: String,
    pub generated_joke_id: Option<Uuid>,
    pub generation_time_ms: Option<i64>,
}

/// The minimal joke fields joined onto a history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JokeSummary {
    pub id: Uuid,
    pub content: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub history: GenerationHistory,
    pub joke: Option<JokeSummary>,
}

//=========================================================================================
// Read-time Aggregates
//=========================================================================================

/// Aggregates computed from a joke's related rating and favorite rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JokeStats {
    /// `None` when the joke has no ratings; an unrated joke is not a zero-rated one.
    pub average_rating: Option<f64>,
    pub total_ratings: u32,
    pub user_rating: Option<i16>,
    pub is_favorited: bool,
}

impl JokeStats {
    /// Folds zero-or-more related rows into per-joke stats relative to `caller`.
    ///
    /// `ratings` are `(user_id, rating)` pairs for this joke and `favorited_by`
    /// lists the users who favorited it.
    pub fn from_related(
        ratings: &[(Uuid, i16)],
        favorited_by: &[Uuid],
        caller: Option<Uuid>,
    ) -> Self {
        let total_ratings = ratings.len() as u32;
        let average_rating = if ratings.is_empty() {
            None
        } else {
            let sum: f64 = ratings.iter().map(|(_, r)| f64::from(*r)).sum();
            Some(sum / f64::from(total_ratings))
        };

        let user_rating = caller.and_then(|caller| {
            ratings
                .iter()
                .find(|(user_id, _)| *user_id == caller)
                .map(|(_, r)| *r)
        });
        let is_favorited = caller.is_some_and(|caller| favorited_by.contains(&caller));

        Self {
            average_rating,
            total_ratings,
            user_rating,
            is_favorited,
        }
    }
}

/// A joke together with its read-time aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct JokeWithStats {
    pub joke: Joke,
    pub stats: JokeStats,
}

/// Listing parameters for public jokes.
#[derive(Debug, Clone, Default)]
pub struct JokeQuery {
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub caller_id: Option<Uuid>,
    pub include_ratings: bool,
}

//=========================================================================================
// Generation
//=========================================================================================

/// Everything the LLM gateway needs to produce one joke.
#[derive(Debug, Clone)]
pub struct JokeRequest {
    /// Empty means "use the category's default prompt".
    pub prompt: String,
    pub category: String,
    pub model: String,
    pub max_tokens: u32,
    pub content_filter: ContentFilterLevel,
    pub creativity: f32,
    pub language: Language,
}

/// A successful gateway response.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedJoke {
    pub content: String,
    pub model_used: String,
    pub elapsed_ms: i64,
}

/// One entry in the gateway's model catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub context_length: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrated_joke_has_no_average() {
        let stats = JokeStats::from_related(&[], &[], None);
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.total_ratings, 0);
        assert!(!stats.is_favorited);
    }

    #[test]
    fn average_is_the_arithmetic_mean() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stats = JokeStats::from_related(&[(a, 2), (b, 5)], &[], None);
        assert_eq!(stats.average_rating, Some(3.5));
        assert_eq!(stats.total_ratings, 2);
    }

    #[test]
    fn caller_fields_are_relative_to_the_caller() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ratings = [(other, 1), (me, 4)];

        let mine = JokeStats::from_related(&ratings, &[me], Some(me));
        assert_eq!(mine.user_rating, Some(4));
        assert!(mine.is_favorited);

        let theirs = JokeStats::from_related(&ratings, &[me], Some(Uuid::new_v4()));
        assert_eq!(theirs.user_rating, None);
        assert!(!theirs.is_favorited);

        let anonymous = JokeStats::from_related(&ratings, &[me], None);
        assert_eq!(anonymous.user_rating, None);
        assert!(!anonymous.is_favorited);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<ContentFilterLevel>(), Ok(ContentFilterLevel::High));
        assert_eq!(" ru ".parse::<Language>(), Ok(Language::Ru));
        assert!("fr".parse::<Language>().is_err());
        assert!("extreme".parse::<ContentFilterLevel>().is_err());
    }
}
