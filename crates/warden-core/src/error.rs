//! Error types for `warden-core`.
//!
//! Policy errors (self-report, duplicate report, no-change decision) are
//! first-class variants so the API layer can map them to 4xx without
//! downcasting. Storage backends fold their internal failures into
//! [`Error::Storage`].

use thiserror::Error;
use uuid::Uuid;

use crate::record::ModerationStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("media not found: {0}")]
  MediaNotFound(Uuid),

  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("reporter {reporter_id} owns media {media_id}")]
  SelfReport { media_id: Uuid, reporter_id: String },

  #[error("reporter {reporter_id} has already reported media {media_id}")]
  DuplicateReport { media_id: Uuid, reporter_id: String },

  #[error("report description exceeds {max} characters")]
  DescriptionTooLong { max: usize },

  #[error("media {media_id} already has status {status}")]
  NoChange {
    media_id: Uuid,
    status:   ModerationStatus,
  },

  /// An admin decision targeted a status that decisions cannot set.
  #[error("invalid admin decision: {0}")]
  InvalidDecision(ModerationStatus),

  /// Optimistic-concurrency conflict that survived the bounded retries.
  #[error("concurrent update on media {0}")]
  Conflict(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
