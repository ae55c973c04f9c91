pub mod domain;
pub mod ports;
pub mod prompts;
pub mod sampling;

pub use domain::{
    Category, ContentFilterLevel, Favorite, GeneratedJoke, GenerationHistory, HistoryEntry, Joke,
    JokeQuery, JokeRequest, JokeStats, JokeSummary, JokeWithStats, Language, ModelInfo,
    NewGenerationHistory, NewJoke, PreferencesUpdate, Rating, UserPreferences,
};
pub use ports::{IdentityService, JokeGenerationService, JokeRepository, PortError, PortResult};
pub use prompts::{validate_catalog, CatalogError, JokeCategory};
pub use sampling::SamplingParams;
