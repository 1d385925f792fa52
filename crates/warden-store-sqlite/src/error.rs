//! Error type for `warden-store-sqlite`.
//!
//! Internal plumbing errors (database, decode) live here; at the trait
//! boundary everything folds into [`warden_core::Error`], with policy
//! conditions (duplicate report, CAS conflict) surfaced as their typed
//! variants rather than as storage noise.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown discriminant in column {column}: {value:?}")]
  UnknownDiscriminant { column: &'static str, value: String },
}

impl From<Error> for warden_core::Error {
  fn from(e: Error) -> Self { warden_core::Error::Storage(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
