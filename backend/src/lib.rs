//! Retail Back-Office Platform backend
//!
//! Handlers, routes and the transactional services behind the HTTP
//! server. The `rbo-server` binary wires these together; the integration
//! tests drive the services directly.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}
