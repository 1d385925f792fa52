//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Flag sets and audit
//! metadata are stored as compact JSON. Actors use the flat
//! `system:…`/`admin:…` encoding. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_core::{
  audit::{AuditAction, AuditEntry},
  classify::Verdict,
  media::MediaItem,
  record::{Actor, ModerationRecord, ModerationStatus},
  report::{ReportEntry, ReportReason, ReportStatus},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ModerationStatus ─────────────────────────────────────────────────────────

pub fn encode_status(s: ModerationStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<ModerationStatus> {
  match s {
    "pending" => Ok(ModerationStatus::Pending),
    "under_review" => Ok(ModerationStatus::UnderReview),
    "approved" => Ok(ModerationStatus::Approved),
    "rejected" => Ok(ModerationStatus::Rejected),
    other => Err(Error::UnknownDiscriminant {
      column: "status",
      value:  other.to_string(),
    }),
  }
}

// ─── Verdict ──────────────────────────────────────────────────────────────────

pub fn encode_verdict(v: Verdict) -> &'static str { v.as_str() }

pub fn decode_verdict(s: &str) -> Result<Verdict> {
  match s {
    "clean" => Ok(Verdict::Clean),
    "flagged" => Ok(Verdict::Flagged),
    "rejected" => Ok(Verdict::Rejected),
    other => Err(Error::UnknownDiscriminant {
      column: "last_verdict",
      value:  other.to_string(),
    }),
  }
}

// ─── ReportReason ─────────────────────────────────────────────────────────────

pub fn encode_reason(r: ReportReason) -> &'static str {
  match r {
    ReportReason::InappropriateContent => "inappropriate_content",
    ReportReason::NonGospelContent => "non_gospel_content",
    ReportReason::ExplicitLanguage => "explicit_language",
    ReportReason::Violence => "violence",
    ReportReason::SexualContent => "sexual_content",
    ReportReason::Blasphemy => "blasphemy",
    ReportReason::Spam => "spam",
    ReportReason::Copyright => "copyright",
    ReportReason::Other => "other",
  }
}

pub fn decode_reason(s: &str) -> Result<ReportReason> {
  match s {
    "inappropriate_content" => Ok(ReportReason::InappropriateContent),
    "non_gospel_content" => Ok(ReportReason::NonGospelContent),
    "explicit_language" => Ok(ReportReason::ExplicitLanguage),
    "violence" => Ok(ReportReason::Violence),
    "sexual_content" => Ok(ReportReason::SexualContent),
    "blasphemy" => Ok(ReportReason::Blasphemy),
    "spam" => Ok(ReportReason::Spam),
    "copyright" => Ok(ReportReason::Copyright),
    "other" => Ok(ReportReason::Other),
    other => Err(Error::UnknownDiscriminant {
      column: "reason",
      value:  other.to_string(),
    }),
  }
}

// ─── ReportStatus ─────────────────────────────────────────────────────────────

pub fn encode_report_status(s: ReportStatus) -> &'static str {
  match s {
    ReportStatus::Pending => "pending",
    ReportStatus::Reviewed => "reviewed",
    ReportStatus::Resolved => "resolved",
    ReportStatus::Dismissed => "dismissed",
  }
}

pub fn decode_report_status(s: &str) -> Result<ReportStatus> {
  match s {
    "pending" => Ok(ReportStatus::Pending),
    "reviewed" => Ok(ReportStatus::Reviewed),
    "resolved" => Ok(ReportStatus::Resolved),
    "dismissed" => Ok(ReportStatus::Dismissed),
    other => Err(Error::UnknownDiscriminant {
      column: "report status",
      value:  other.to_string(),
    }),
  }
}

// ─── Actor ────────────────────────────────────────────────────────────────────

pub fn decode_actor(s: &str) -> Result<Actor> {
  Actor::decode(s).ok_or_else(|| Error::UnknownDiscriminant {
    column: "actor",
    value:  s.to_string(),
  })
}

// ─── Flags ────────────────────────────────────────────────────────────────────

pub fn encode_flags(flags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(flags)?)
}

pub fn decode_flags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

/// Merge new flags into an existing set: sorted, deduped, nothing removed.
pub fn merge_flags(existing: Vec<String>, added: &[String]) -> Vec<String> {
  let mut merged = existing;
  merged.extend(added.iter().cloned());
  merged.sort();
  merged.dedup();
  merged
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `media_items` row.
pub struct RawMedia {
  pub media_id:   String,
  pub owner_id:   String,
  pub title:      String,
  pub created_at: String,
}

impl RawMedia {
  pub fn into_media(self) -> Result<MediaItem> {
    Ok(MediaItem {
      media_id:   decode_uuid(&self.media_id)?,
      owner_id:   self.owner_id,
      title:      self.title,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `moderation_records` row.
pub struct RawRecord {
  pub media_id:           String,
  pub status:             String,
  pub flags:              String,
  pub report_count:       i64,
  pub admin_notes:        Option<String>,
  pub last_verdict:       Option<String>,
  pub last_transition_at: String,
  pub last_transition_by: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<ModerationRecord> {
    Ok(ModerationRecord {
      media_id:           decode_uuid(&self.media_id)?,
      status:             decode_status(&self.status)?,
      flags:              decode_flags(&self.flags)?,
      report_count:       self.report_count.max(0) as u32,
      admin_notes:        self.admin_notes,
      last_verdict:       self
        .last_verdict
        .as_deref()
        .map(decode_verdict)
        .transpose()?,
      last_transition_at: decode_dt(&self.last_transition_at)?,
      last_transition_by: decode_actor(&self.last_transition_by)?,
    })
  }
}

/// Raw strings read directly from a `report_entries` row.
pub struct RawReport {
  pub report_id:   String,
  pub media_id:    String,
  pub reporter_id: String,
  pub reason:      String,
  pub description: Option<String>,
  pub status:      String,
  pub created_at:  String,
}

impl RawReport {
  pub fn into_report(self) -> Result<ReportEntry> {
    Ok(ReportEntry {
      report_id:   decode_uuid(&self.report_id)?,
      media_id:    decode_uuid(&self.media_id)?,
      reporter_id: self.reporter_id,
      reason:      decode_reason(&self.reason)?,
      description: self.description,
      status:      decode_report_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `audit_entries` row.
pub struct RawAudit {
  pub audit_id:    String,
  pub subject_id:  String,
  pub action:      String,
  pub actor:       String,
  pub reason:      Option<String>,
  pub metadata:    String,
  pub ip_address:  Option<String>,
  pub recorded_at: String,
}

impl RawAudit {
  pub fn into_audit(self) -> Result<AuditEntry> {
    let action = AuditAction::from_str(&self.action).ok_or_else(|| {
      Error::UnknownDiscriminant { column: "action", value: self.action.clone() }
    })?;

    Ok(AuditEntry {
      audit_id:    decode_uuid(&self.audit_id)?,
      subject_id:  decode_uuid(&self.subject_id)?,
      action,
      actor:       decode_actor(&self.actor)?,
      reason:      self.reason,
      metadata:    serde_json::from_str(&self.metadata)?,
      ip_address:  self.ip_address,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
