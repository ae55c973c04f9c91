pub mod generation_task;
pub mod listing_task;
pub mod middleware;
pub mod models;
pub mod rest;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::{AppState, Caller};
