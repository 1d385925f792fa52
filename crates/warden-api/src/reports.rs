//! Handlers for report submission and listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/media/:id/report` | Body: [`ReportBody`]; reporter from `X-User-Id` |
//! | `GET`  | `/media/:id/reports` | All reports for one media item |
//!
//! The reporter's identity arrives in the `X-User-Id` header, injected by the
//! session layer in front of this service.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{
  report::{NewReport, ReportEntry, ReportReason},
  store::ModerationStore,
};

use crate::{AppState, error::ApiError};

const USER_HEADER: &str = "x-user-id";

fn reporter_id(headers: &HeaderMap) -> Result<String, ApiError> {
  headers
    .get(USER_HEADER)
    .and_then(|v| v.to_str().ok())
    .filter(|v| !v.is_empty())
    .map(str::to_string)
    .ok_or_else(|| ApiError::BadRequest("missing X-User-Id header".into()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportBody {
  pub reason:      ReportReason,
  pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportReceipt {
  pub report_id:    Uuid,
  pub report_count: u32,
  /// Whether this report pushed the media into review.
  pub escalated:    bool,
}

/// `POST /media/:id/report` — returns 201 + a [`ReportReceipt`].
///
/// Self-reports, duplicates, and oversized descriptions come back as 400;
/// unknown media as 404.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(media_id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<ReportBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ModerationStore,
{
  let reporter_id = reporter_id(&headers)?;

  let submitted = state
    .aggregator
    .submit(NewReport {
      media_id,
      reporter_id,
      reason: body.reason,
      description: body.description,
    })
    .await?;

  Ok((
    StatusCode::CREATED,
    Json(ReportReceipt {
      report_id:    submitted.report.report_id,
      report_count: submitted.report_count,
      escalated:    submitted.escalated,
    }),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /media/:id/reports`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(media_id): Path<Uuid>,
) -> Result<Json<Vec<ReportEntry>>, ApiError>
where
  S: ModerationStore,
{
  state
    .store
    .get_media(media_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("media {media_id} not found")))?;

  let reports = state.store.list_reports(media_id).await?;
  Ok(Json(reports))
}
