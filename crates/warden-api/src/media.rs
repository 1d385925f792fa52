//! Handlers for `/media` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/media` | Body: [`CreateBody`]; registers and enqueues for classification |
//! | `GET`  | `/media/:id` | Media summary + moderation record + `visible` flag |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{
  media::{MediaItem, NewMedia},
  record::ModerationRecord,
  store::ModerationStore,
};

use crate::{AppState, error::ApiError};

/// A media item with its moderation state, as served to clients.
#[derive(Debug, Serialize)]
pub struct MediaView {
  pub media:   MediaItem,
  pub record:  ModerationRecord,
  /// The visibility contract: everything except `rejected` is visible.
  pub visible: bool,
}

impl MediaView {
  fn new(media: MediaItem, record: ModerationRecord) -> Self {
    let visible = record.is_visible();
    Self { media, record, visible }
  }
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub owner_id: String,
  pub title:    String,
}

/// `POST /media` — returns 201 + the stored [`MediaView`].
///
/// The new record starts `pending`; classification happens asynchronously
/// via the consumer task, never in the request path.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ModerationStore,
{
  let media = state
    .store
    .register_media(NewMedia { owner_id: body.owner_id, title: body.title })
    .await?;

  let record = state
    .store
    .get_record(media.media_id)
    .await?
    .ok_or_else(|| ApiError::Internal("record missing after insert".into()))?;

  state.queue.enqueue(media.media_id);

  Ok((StatusCode::CREATED, Json(MediaView::new(media, record))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /media/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<MediaView>, ApiError>
where
  S: ModerationStore,
{
  let media = state
    .store
    .get_media(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("media {id} not found")))?;

  let record = state
    .store
    .get_record(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("media {id} not found")))?;

  Ok(Json(MediaView::new(media, record)))
}
