//! Server configuration and HTTP application assembly for Almoner.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the store and
//! serves [`app`]; tests build the same application over an in-memory store.

use std::{path::Path, time::Duration};

use almoner_core::repository::Repositories;
use almoner_store_sqlite::PoolConfig;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `ALMONER__DATABASE__PATH`.
pub const ENV_PREFIX: &str = "ALMONER";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  /// Deadline applied to each request's context; 0 disables it.
  pub request_timeout_secs: u64,
  pub database:             DatabaseConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      request_timeout_secs: 30,
      database:             DatabaseConfig::default(),
    }
  }
}

/// The SQLite file and its connection pool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  pub path:              String,
  pub max_open:          usize,
  pub max_idle:          usize,
  /// 0 keeps connections for the life of the process.
  pub max_lifetime_secs: u64,
  pub busy_timeout_ms:   u64,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    let pool = PoolConfig::default();
    Self {
      path:              "almoner.db".to_string(),
      max_open:          pool.max_open,
      max_idle:          pool.max_idle,
      max_lifetime_secs: pool.max_lifetime.map_or(0, |d| d.as_secs()),
      busy_timeout_ms:   pool.busy_timeout.as_millis() as u64,
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `ALMONER__*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn request_timeout(&self) -> Option<Duration> {
    (self.request_timeout_secs > 0)
      .then(|| Duration::from_secs(self.request_timeout_secs))
  }

  pub fn pool_config(&self) -> PoolConfig {
    let db = &self.database;
    PoolConfig {
      max_open:     db.max_open,
      max_idle:     db.max_idle,
      max_lifetime: (db.max_lifetime_secs > 0)
        .then(|| Duration::from_secs(db.max_lifetime_secs)),
      busy_timeout: Duration::from_millis(db.busy_timeout_ms),
    }
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The full HTTP application: the API under `/api/v1`, with a tracing span
/// per request.
pub fn app<R: Repositories>(store: &R, config: &ServerConfig) -> Router {
  Router::new()
    .nest(
      "/api/v1",
      almoner_api::api_router(store, config.request_timeout()),
    )
    .layer(TraceLayer::new_for_http())
}
