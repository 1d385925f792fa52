//! Report entries — one per (reporter, media) pair.
//!
//! Reports are never deleted. Their own `status` is updated only by an admin
//! review action and is independent of the owning media's moderation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Upper bound on the free-text description accepted with a report.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Why the reporter flagged the media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
  InappropriateContent,
  NonGospelContent,
  ExplicitLanguage,
  Violence,
  SexualContent,
  Blasphemy,
  Spam,
  Copyright,
  Other,
}

/// Review status of an individual report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
  Pending,
  Reviewed,
  Resolved,
  Dismissed,
}

/// A stored report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
  pub report_id:   Uuid,
  pub media_id:    Uuid,
  pub reporter_id: String,
  pub reason:      ReportReason,
  pub description: Option<String>,
  pub status:      ReportStatus,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ModerationStore::insert_report`].
/// `report_id`, `status`, and `created_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewReport {
  pub media_id:    Uuid,
  pub reporter_id: String,
  pub reason:      ReportReason,
  pub description: Option<String>,
}

impl NewReport {
  /// Reject oversized descriptions before anything touches storage.
  pub fn validate(&self) -> Result<()> {
    if let Some(d) = &self.description
      && d.chars().count() > MAX_DESCRIPTION_LEN
    {
      return Err(Error::DescriptionTooLong { max: MAX_DESCRIPTION_LEN });
    }
    Ok(())
  }
}
