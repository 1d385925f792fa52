//! Audit entries — the append-only accountability trail.
//!
//! Every state transition and every privileged admin action produces exactly
//! one entry. Entries are never mutated or deleted after creation; the store
//! exposes no update path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Actor;

/// What happened. The discriminant string is stored in the `action` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
  /// A classifier verdict was applied to a moderation record.
  ClassificationApplied,
  /// The report-count threshold escalated a record into review.
  ReportEscalation,
  /// An admin moved a record's status (approve / reject / hold).
  AdminDecision,
  /// An admin reviewed an individual report entry.
  ReportReviewed,
}

impl AuditAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ClassificationApplied => "classification_applied",
      Self::ReportEscalation => "report_escalation",
      Self::AdminDecision => "admin_decision",
      Self::ReportReviewed => "report_reviewed",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "classification_applied" => Some(Self::ClassificationApplied),
      "report_escalation" => Some(Self::ReportEscalation),
      "admin_decision" => Some(Self::AdminDecision),
      "report_reviewed" => Some(Self::ReportReviewed),
      _ => None,
    }
  }
}

/// A stored audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub audit_id:    Uuid,
  /// The media item (or report) the action concerns.
  pub subject_id:  Uuid,
  pub action:      AuditAction,
  pub actor:       Actor,
  pub reason:      Option<String>,
  /// Structured context — verdict, flags, old/new status, report counts.
  pub metadata:    serde_json::Value,
  pub ip_address:  Option<String>,
  pub recorded_at: DateTime<Utc>,
}

/// Input to an audit write. `audit_id` and `recorded_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub subject_id: Uuid,
  pub action:     AuditAction,
  pub actor:      Actor,
  pub reason:     Option<String>,
  pub metadata:   serde_json::Value,
  pub ip_address: Option<String>,
}

impl NewAuditEntry {
  pub fn new(subject_id: Uuid, action: AuditAction, actor: Actor) -> Self {
    Self {
      subject_id,
      action,
      actor,
      reason: None,
      metadata: serde_json::Value::Object(Default::default()),
      ip_address: None,
    }
  }
}

/// Parameters for [`crate::store::ModerationStore::list_audit`].
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
  pub subject_id: Option<Uuid>,
  /// Encoded actor string, e.g. `admin:carol` or `system:classifier`.
  pub actor:      Option<String>,
  pub from:       Option<DateTime<Utc>>,
  pub to:         Option<DateTime<Utc>>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}
