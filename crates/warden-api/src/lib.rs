//! JSON REST API for Warden.
//!
//! Exposes an axum [`Router`] backed by any [`warden_core::store::ModerationStore`].
//! Public routes identify the caller via the `X-User-Id` header (injected by
//! an upstream session layer); admin routes use HTTP Basic auth with
//! per-admin argon2 hashes from the server configuration.

pub mod admin;
pub mod auth;
pub mod classifier;
pub mod error;
pub mod media;
pub mod reports;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use serde::Deserialize;
use warden_core::{
  aggregator::ReportAggregator, classify::ClassifyQueue,
  engine::ModerationEngine, store::ModerationStore,
};

pub use error::ApiError;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  /// Reports needed to escalate a record into review.
  #[serde(default = "default_report_threshold")]
  pub report_threshold: u32,

  /// Time box for a single classifier call, in seconds.
  #[serde(default = "default_classify_timeout_secs")]
  pub classify_timeout_secs: u64,

  /// Admins: Basic-auth credentials, notification recipients, and the
  /// directory behind the `admins` audience.
  #[serde(default)]
  pub admins: Vec<auth::AdminCredential>,

  /// Title terms that make the built-in classifier flag a media item.
  #[serde(default)]
  pub flag_terms: Vec<String>,

  /// Title terms that make the built-in classifier reject a media item.
  #[serde(default)]
  pub reject_terms: Vec<String>,
}

fn default_report_threshold() -> u32 { 3 }

fn default_classify_timeout_secs() -> u64 { 30 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub engine:     ModerationEngine<S>,
  pub aggregator: ReportAggregator<S>,
  pub queue:      ClassifyQueue,
  pub auth:       Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      engine:     self.engine.clone(),
      aggregator: self.aggregator.clone(),
      queue:      self.queue.clone(),
      auth:       Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ModerationStore + 'static,
{
  Router::new()
    // Public
    .route("/media", post(media::create::<S>))
    .route("/media/{id}", get(media::get_one::<S>))
    .route("/media/{id}/report", post(reports::create::<S>))
    .route("/media/{id}/reports", get(reports::list::<S>))
    // Admin
    .route("/admin/moderation/queue", get(admin::queue::<S>))
    .route("/admin/moderation/stale", get(admin::stale::<S>))
    .route(
      "/admin/moderation/{media_id}/status",
      patch(admin::set_status::<S>),
    )
    .route("/admin/reports/{id}", patch(admin::review_report::<S>))
    .route("/admin/activity", get(admin::activity::<S>))
    .with_state(state)
}
