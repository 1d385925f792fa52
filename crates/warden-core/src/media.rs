//! The minimal media registry the pipeline needs.
//!
//! Warden does not store or serve media content. It keeps only the identity,
//! ownership, and title of each item — enough for self-report checks and
//! notification payloads. Registering an item creates its `pending`
//! moderation record in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
  pub media_id:   Uuid,
  pub owner_id:   String,
  pub title:      String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ModerationStore::register_media`].
#[derive(Debug, Clone)]
pub struct NewMedia {
  pub owner_id: String,
  pub title:    String,
}
