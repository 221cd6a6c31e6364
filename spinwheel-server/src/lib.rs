//! HTTP API for the spinwheel prize draw.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerArgs;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
