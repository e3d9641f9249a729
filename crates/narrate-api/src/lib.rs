//! HTTP boundary for the narrated scene compiler.
//!
//! Exposes one compile endpoint that accepts a JSON compile request and
//! answers with the finished video inlined as a `data:` URL, plus health,
//! readiness and Prometheus endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
