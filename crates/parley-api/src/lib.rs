pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;

pub use app::build_router;
pub use service::{ChatError, ChatHistory, ChatService, HistoryMessage, HistoryRole};
pub use state::AppState;
