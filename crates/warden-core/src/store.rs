//! The `ModerationStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `warden-store-sqlite`).
//! Higher layers (the engine, the aggregator, `warden-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! All methods return [`crate::Error`] directly so policy failures raised by
//! constraints (duplicate report, status conflict) keep their type across the
//! store boundary; backend-internal failures arrive as [`crate::Error::Storage`].

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error,
  audit::{AuditEntry, AuditQuery, NewAuditEntry},
  classify::Verdict,
  media::{MediaItem, NewMedia},
  record::{Actor, ModerationRecord, ModerationStatus},
  report::{NewReport, ReportEntry, ReportStatus},
};

// ─── Write descriptors ───────────────────────────────────────────────────────

/// A compare-and-swap write against one moderation record.
///
/// Committed together with its audit entry in a single transaction; the store
/// returns [`Error::Conflict`] if `expected_status` no longer matches.
#[derive(Debug, Clone)]
pub struct TransitionUpdate {
  pub media_id:        Uuid,
  pub expected_status: ModerationStatus,
  pub new_status:      ModerationStatus,
  /// Flags to merge into the record's accumulated set.
  pub add_flags:       Vec<String>,
  pub admin_notes:     Option<String>,
  pub set_verdict:     Option<Verdict>,
  /// Explicit admin reset — the only path by which `report_count` decreases.
  pub reset_report_count: bool,
  pub actor:           Actor,
}

impl TransitionUpdate {
  pub fn new(
    media_id: Uuid,
    expected_status: ModerationStatus,
    new_status: ModerationStatus,
    actor: Actor,
  ) -> Self {
    Self {
      media_id,
      expected_status,
      new_status,
      add_flags: Vec::new(),
      admin_notes: None,
      set_verdict: None,
      reset_report_count: false,
      actor,
    }
  }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ModerationStore::list_queue`].
#[derive(Debug, Clone, Default)]
pub struct QueueQuery {
  pub status: Option<ModerationStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// One moderation-queue row: the record joined with its media summary.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueItem {
  pub record: ModerationRecord,
  pub media:  MediaItem,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Warden storage backend.
///
/// Audit writes are append-only; no update or delete path exists. Status
/// writes go through [`ModerationStore::commit_transition`] so that the
/// transition and its audit record are durable together.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ModerationStore: Send + Sync {
  // ── Media registry ────────────────────────────────────────────────────

  /// Persist a media item and its initial `pending` moderation record in
  /// one transaction.
  fn register_media(
    &self,
    input: NewMedia,
  ) -> impl Future<Output = Result<MediaItem, Error>> + Send + '_;

  fn get_media(
    &self,
    media_id: Uuid,
  ) -> impl Future<Output = Result<Option<MediaItem>, Error>> + Send + '_;

  // ── Moderation records ────────────────────────────────────────────────

  fn get_record(
    &self,
    media_id: Uuid,
  ) -> impl Future<Output = Result<Option<ModerationRecord>, Error>> + Send + '_;

  /// Apply `update` and append `audit` atomically.
  ///
  /// Returns the record as written. Fails with [`Error::Conflict`] if the
  /// record's status no longer equals `update.expected_status`, and with
  /// [`Error::MediaNotFound`] if no record exists.
  fn commit_transition(
    &self,
    update: TransitionUpdate,
    audit: NewAuditEntry,
  ) -> impl Future<Output = Result<ModerationRecord, Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Insert a report and atomically increment the media's report counter,
  /// in one transaction. Returns the stored entry and the post-increment
  /// count (read back inside the same transaction, so threshold evaluation
  /// happens strictly after the increment is visible).
  ///
  /// Fails with [`Error::DuplicateReport`] if this reporter already has a
  /// report for this media item.
  fn insert_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<(ReportEntry, u32), Error>> + Send + '_;

  /// Admin review of a single report. Audited in the same transaction.
  fn set_report_status(
    &self,
    report_id: Uuid,
    status: ReportStatus,
    audit: NewAuditEntry,
  ) -> impl Future<Output = Result<ReportEntry, Error>> + Send + '_;

  fn list_reports(
    &self,
    media_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReportEntry>, Error>> + Send + '_;

  // ── Admin read views ──────────────────────────────────────────────────

  /// The moderation queue: records joined with media summaries, most
  /// recent transition first.
  fn list_queue(
    &self,
    query: QueueQuery,
  ) -> impl Future<Output = Result<Vec<QueueItem>, Error>> + Send + '_;

  /// Records still `pending` whose last transition predates `older_than` —
  /// the escape hatch for a classifier that never reported back.
  fn list_stale_pending(
    &self,
    older_than: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<QueueItem>, Error>> + Send + '_;

  // ── Audit trail ───────────────────────────────────────────────────────

  /// Append-only audit insert for privileged actions that are not part of
  /// a status transition.
  fn record_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Error>> + Send + '_;

  fn list_audit(
    &self,
    query: AuditQuery,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Error>> + Send + '_;
}
