//! Classification intake — the async consumer between upload and the engine.
//!
//! Classification runs out of the request path: registering a media item
//! only enqueues its id. A dedicated consumer task calls the external
//! [`ClassificationAdapter`] with a bounded time box and applies the outcome
//! through the engine. A classifier timeout or failure leaves the record
//! `pending` — it never fails open to `approved` nor closed to `rejected`;
//! stale records are surfaced on the admin stale-pending view instead.

use std::{future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{engine::ModerationEngine, media::MediaItem, store::ModerationStore};

// ─── Verdict ─────────────────────────────────────────────────────────────────

/// The verdict produced by the external content-safety classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Clean,
  Flagged,
  Rejected,
}

impl Verdict {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Clean => "clean",
      Self::Flagged => "flagged",
      Self::Rejected => "rejected",
    }
  }
}

/// The full classifier result for one media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationOutcome {
  pub verdict:    Verdict,
  /// Flag strings to accumulate onto the moderation record.
  #[serde(default)]
  pub flags:      Vec<String>,
  pub transcript: Option<String>,
}

// ─── Adapter trait ───────────────────────────────────────────────────────────

/// Abstraction over the external classifier. Retries are the adapter's
/// concern; the consumer calls it once per enqueued item.
pub trait ClassificationAdapter: Send + Sync {
  fn classify(
    &self,
    media: &MediaItem,
  ) -> impl Future<
    Output = Result<
      ClassificationOutcome,
      Box<dyn std::error::Error + Send + Sync>,
    >,
  > + Send;
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// Cloneable handle for enqueuing media ids for classification.
#[derive(Clone)]
pub struct ClassifyQueue {
  tx: mpsc::UnboundedSender<Uuid>,
}

impl ClassifyQueue {
  /// A queue handle plus the raw receiver — used by tests to observe
  /// enqueues without running a consumer.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  /// Hand a media id to the consumer. Dropped (with a warning) if the
  /// consumer has shut down — the record simply stays `pending`.
  pub fn enqueue(&self, media_id: Uuid) {
    if self.tx.send(media_id).is_err() {
      tracing::warn!(%media_id, "classification consumer is gone; media stays pending");
    }
  }
}

/// Spawn the classification consumer task.
///
/// Returns the enqueue handle and the task's [`tokio::task::JoinHandle`].
/// The task exits when every [`ClassifyQueue`] clone has been dropped.
pub fn spawn_consumer<S, A>(
  engine:  ModerationEngine<S>,
  adapter: Arc<A>,
  timeout: Duration,
) -> (ClassifyQueue, tokio::task::JoinHandle<()>)
where
  S: ModerationStore + 'static,
  A: ClassificationAdapter + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel::<Uuid>();

  let handle = tokio::spawn(async move {
    while let Some(media_id) = rx.recv().await {
      let media = match engine.store().get_media(media_id).await {
        Ok(Some(m)) => m,
        Ok(None) => {
          tracing::warn!(%media_id, "enqueued media no longer exists");
          continue;
        }
        Err(e) => {
          tracing::error!(%media_id, error = %e, "media lookup failed");
          continue;
        }
      };

      let outcome =
        match tokio::time::timeout(timeout, adapter.classify(&media)).await {
          Ok(Ok(outcome)) => outcome,
          Ok(Err(e)) => {
            tracing::warn!(%media_id, error = %e, "classifier failed; media stays pending");
            continue;
          }
          Err(_) => {
            tracing::warn!(%media_id, ?timeout, "classifier timed out; media stays pending");
            continue;
          }
        };

      if let Err(e) = engine.apply_classification(media_id, &outcome).await {
        tracing::error!(%media_id, error = %e, "failed to apply classification");
      }
    }
  });

  (ClassifyQueue { tx }, handle)
}
