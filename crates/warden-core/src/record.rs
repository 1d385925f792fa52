//! The moderation record — the per-media lifecycle object.
//!
//! One record exists per media item, created when the media is registered.
//! Its `status` is written only through the Moderation Engine; `flags`
//! accumulate and are never silently cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::Verdict;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
  Pending,
  UnderReview,
  Approved,
  Rejected,
}

impl ModerationStatus {
  /// The discriminant string stored in the `status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::UnderReview => "under_review",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }
}

impl std::fmt::Display for ModerationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// Who triggered a transition. Every audit entry carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
  System(SystemActor),
  Admin { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemActor {
  Classifier,
  ReportThreshold,
}

impl Actor {
  pub fn admin(id: impl Into<String>) -> Self { Self::Admin { id: id.into() } }

  /// The flat string stored in the `actor` / `last_transition_by` columns,
  /// e.g. `system:classifier` or `admin:carol`.
  pub fn encode(&self) -> String {
    match self {
      Self::System(SystemActor::Classifier) => "system:classifier".to_string(),
      Self::System(SystemActor::ReportThreshold) => {
        "system:report-threshold".to_string()
      }
      Self::Admin { id } => format!("admin:{id}"),
    }
  }

  pub fn decode(s: &str) -> Option<Self> {
    match s {
      "system:classifier" => Some(Self::System(SystemActor::Classifier)),
      "system:report-threshold" => {
        Some(Self::System(SystemActor::ReportThreshold))
      }
      other => other
        .strip_prefix("admin:")
        .map(|id| Self::Admin { id: id.to_string() }),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The per-media moderation lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRecord {
  pub media_id:           Uuid,
  pub status:             ModerationStatus,
  /// Accumulated flag strings (e.g. `explicit_language`); sorted, deduped,
  /// never silently cleared.
  pub flags:              Vec<String>,
  pub report_count:       u32,
  pub admin_notes:        Option<String>,
  /// The last classifier verdict applied; used to make re-delivery of the
  /// same verdict a no-op.
  pub last_verdict:       Option<Verdict>,
  pub last_transition_at: DateTime<Utc>,
  pub last_transition_by: Actor,
}

impl ModerationRecord {
  /// The visibility contract exposed to the content-serving layer.
  pub fn is_visible(&self) -> bool {
    self.status != ModerationStatus::Rejected
  }
}
