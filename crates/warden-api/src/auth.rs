//! HTTP Basic-auth extractor for admin routes.
//!
//! The Basic username is the admin id; each admin carries an argon2 PHC hash
//! in the server configuration. Successful extraction yields the admin id,
//! which becomes the `admin:<id>` actor on every audited decision.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use warden_core::store::ModerationStore;

use crate::{AppState, error::ApiError};

/// One admin account: Basic-auth identity plus notification recipient.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminCredential {
  pub id:            String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub admins: Vec<AdminCredential>,
}

/// Present in a handler means the request carried valid admin credentials;
/// holds the authenticated admin id.
pub struct AdminIdentity(pub String);

/// Verify credentials directly from headers; returns the admin id.
pub fn verify_auth(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<String, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds =
    std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let admin = config
    .admins
    .iter()
    .find(|a| a.id == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&admin.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(admin.id.clone())
}

impl<S> FromRequestParts<AppState<S>> for AdminIdentity
where
  S: ModerationStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let admin_id = verify_auth(&parts.headers, &state.auth)?;
    Ok(AdminIdentity(admin_id))
  }
}

/// Test helper: argon2 PHC hash for `password`.
#[cfg(test)]
pub(crate) fn password_hash_for(password: &str) -> String {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string()
}
