//! Core types and trait definitions for the Warden moderation pipeline.
//!
//! Everything here is storage- and transport-agnostic: the state machine,
//! the aggregator, and the dispatcher know the [`store::ModerationStore`]
//! trait and nothing about SQLite or HTTP.

// Native `async fn` in traits; the advisory lint about `Send` bounds on the
// returned futures does not apply since the trait spells them out.
#![allow(async_fn_in_trait)]

pub mod aggregator;
pub mod audit;
pub mod classify;
pub mod engine;
pub mod error;
pub mod media;
pub mod notify;
pub mod record;
pub mod report;
pub mod store;

pub use error::{Error, Result};
