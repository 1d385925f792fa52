//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// Map the domain's policy taxonomy onto HTTP statuses: policy and validation
/// failures are the caller's fault (400), unknown ids are 404, a CAS conflict
/// that survived the engine's retries is 409, and storage noise is 500.
impl From<warden_core::Error> for ApiError {
  fn from(e: warden_core::Error) -> Self {
    use warden_core::Error as E;
    match e {
      E::MediaNotFound(_) | E::ReportNotFound(_) => {
        ApiError::NotFound(e.to_string())
      }
      E::SelfReport { .. }
      | E::DuplicateReport { .. }
      | E::DescriptionTooLong { .. }
      | E::NoChange { .. }
      | E::InvalidDecision(_) => ApiError::BadRequest(e.to_string()),
      E::Conflict(_) => ApiError::Conflict(e.to_string()),
      E::Serialization(_) | E::Storage(_) => ApiError::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };

    let mut response =
      (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Basic realm=\"warden-admin\""),
      );
    }
    response
  }
}
