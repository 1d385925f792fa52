//! Handlers for the Basic-authenticated `/admin` surface.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/admin/moderation/queue` | `?status=&page=&limit=` |
//! | `GET`   | `/admin/moderation/stale` | `?minutes=`; pending records the classifier never came back for |
//! | `PATCH` | `/admin/moderation/:media_id/status` | Body: [`StatusBody`] |
//! | `PATCH` | `/admin/reports/:id` | Body: `{"status":"dismissed"}` |
//! | `GET`   | `/admin/activity` | Audit trail; `?subject_id=&actor=&from=&to=&page=&limit=` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::HeaderMap,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;
use warden_core::{
  audit::{AuditAction, AuditEntry, AuditQuery, NewAuditEntry},
  engine::AdminDecision,
  record::{Actor, ModerationRecord, ModerationStatus},
  report::{ReportEntry, ReportStatus},
  store::{ModerationStore, QueueItem, QueueQuery},
};

use crate::{AppState, auth::AdminIdentity, error::ApiError};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;
const DEFAULT_STALE_MINUTES: i64 = 15;

/// Page/limit params are caller-supplied; clamp the limit and saturate the
/// offset so no query-string value can overflow.
fn page_window(
  page: Option<usize>,
  limit: Option<usize>,
) -> (Option<usize>, Option<usize>) {
  let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
  let offset = page.unwrap_or(0).saturating_mul(limit);
  (Some(limit), Some(offset))
}

// ─── Queue ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueueParams {
  pub status: Option<ModerationStatus>,
  pub page:   Option<usize>,
  pub limit:  Option<usize>,
}

/// `GET /admin/moderation/queue[?status=under_review&page=0&limit=50]`
pub async fn queue<S>(
  _admin: AdminIdentity,
  State(state): State<AppState<S>>,
  Query(params): Query<QueueParams>,
) -> Result<Json<Vec<QueueItem>>, ApiError>
where
  S: ModerationStore,
{
  let (limit, offset) = page_window(params.page, params.limit);
  let items = state
    .store
    .list_queue(QueueQuery { status: params.status, limit, offset })
    .await?;
  Ok(Json(items))
}

// ─── Stale pending ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StaleParams {
  /// Age cutoff in minutes; defaults to 15.
  pub minutes: Option<i64>,
}

/// `GET /admin/moderation/stale[?minutes=15]` — records still `pending`
/// past the cutoff, i.e. media the classifier never reported back on.
pub async fn stale<S>(
  _admin: AdminIdentity,
  State(state): State<AppState<S>>,
  Query(params): Query<StaleParams>,
) -> Result<Json<Vec<QueueItem>>, ApiError>
where
  S: ModerationStore,
{
  let minutes = params.minutes.unwrap_or(DEFAULT_STALE_MINUTES);
  let older_than = Utc::now() - Duration::minutes(minutes);
  let items = state.store.list_stale_pending(older_than).await?;
  Ok(Json(items))
}

// ─── Status decision ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:      ModerationStatus,
  pub admin_notes: Option<String>,
  pub reason:      Option<String>,
  #[serde(default)]
  pub reset_reports: bool,
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
  headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(|v| v.trim().to_string())
}

/// `PATCH /admin/moderation/:media_id/status`
///
/// Drives an admin-decision transition: approve, reject, put (back) under
/// review, override a rejection, or handle an appeal. Re-submitting the
/// current status is a 400 so double-clicks don't pollute the audit trail.
pub async fn set_status<S>(
  AdminIdentity(admin_id): AdminIdentity,
  State(state): State<AppState<S>>,
  Path(media_id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<StatusBody>,
) -> Result<Json<ModerationRecord>, ApiError>
where
  S: ModerationStore,
{
  let record = state
    .engine
    .apply_admin_decision(media_id, AdminDecision {
      admin_id,
      status: body.status,
      admin_notes: body.admin_notes,
      reason: body.reason,
      reset_reports: body.reset_reports,
      ip_address: forwarded_for(&headers),
    })
    .await?;
  Ok(Json(record))
}

// ─── Report review ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status: ReportStatus,
}

/// `PATCH /admin/reports/:id` — review one report; the media's moderation
/// record is untouched.
pub async fn review_report<S>(
  AdminIdentity(admin_id): AdminIdentity,
  State(state): State<AppState<S>>,
  Path(report_id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<ReportEntry>, ApiError>
where
  S: ModerationStore,
{
  let audit = NewAuditEntry::new(
    report_id,
    AuditAction::ReportReviewed,
    Actor::admin(admin_id),
  );
  let report = state
    .store
    .set_report_status(report_id, body.status, audit)
    .await?;
  Ok(Json(report))
}

// ─── Activity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
  pub subject_id: Option<Uuid>,
  /// Encoded actor, e.g. `admin:carol` or `system:classifier`.
  pub actor:      Option<String>,
  pub from:       Option<DateTime<Utc>>,
  pub to:         Option<DateTime<Utc>>,
  pub page:       Option<usize>,
  pub limit:      Option<usize>,
}

/// `GET /admin/activity` — the append-only audit trail, newest first.
pub async fn activity<S>(
  _admin: AdminIdentity,
  State(state): State<AppState<S>>,
  Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  S: ModerationStore,
{
  let (limit, offset) = page_window(params.page, params.limit);
  let entries = state
    .store
    .list_audit(AuditQuery {
      subject_id: params.subject_id,
      actor: params.actor,
      from: params.from,
      to: params.to,
      limit,
      offset,
    })
    .await?;
  Ok(Json(entries))
}
