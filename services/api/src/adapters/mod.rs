pub mod db;
pub mod identity;
pub mod llm;

pub use db::DbAdapter;
pub use identity::HttpIdentityAdapter;
pub use llm::OpenRouterJokeAdapter;
