//! SQLite backend for the Warden moderation store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The single-connection model also
//! serialises writers, which the per-media compare-and-swap in
//! [`warden_core::store::ModerationStore::commit_transition`] relies on only
//! as a fallback — correctness comes from the CAS itself.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
