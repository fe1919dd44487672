pub mod admin;
pub mod ai;
pub mod analytics;
pub mod auth;
pub mod dto;
pub mod effects;
pub mod habits;
pub mod middleware;
pub mod notifications;
pub mod partners;
pub mod response;
pub mod rest;
pub mod state;
pub mod tasks;
pub mod work_session;

// Re-export what the binaries need to assemble the server.
pub use middleware::require_auth;
pub use rest::{router, ApiDoc};
pub use state::AppState;
