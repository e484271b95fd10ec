//! spamcheck server
//!
//! HTTP API over the spam classification service:
//!
//! - `POST /api/ml/classify/`: classify one message
//! - `GET /api/ml/health/`: model availability
//! - `GET /api/ml/history/`: recent classifications, anonymized
//! - `GET /health`, `GET /metrics`: liveness and Prometheus metrics

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::{ConfigOverrides, ListenConfig, RateLimitConfig, ServerConfig};
pub use error::AppError;
pub use rate_limit::RateLimiter;
pub use routes::{create_router, SERVICE_NAME};
pub use state::AppState;
