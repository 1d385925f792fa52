//! Notification intents and the dispatcher that drains them.
//!
//! The engine commits state + audit first, then hands intents to a
//! [`Notifier`]; a spawned drain task resolves each intent into per-recipient
//! messages and sends them through an external [`Transport`]. Delivery
//! failures are logged and counted, never propagated — losing an intent can
//! never corrupt a moderation record.

use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

// ─── Intent ──────────────────────────────────────────────────────────────────

/// Who should be informed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
  Admins,
  Owner,
}

/// Which message to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
  FlaggedForReview,
  ContentRejected,
  ReportThresholdReached,
}

/// An ephemeral instruction to inform an audience. Never persisted beyond
/// dispatch; produced by the engine strictly after its transition committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationIntent {
  pub audience:     Audience,
  pub template:     TemplateKind,
  pub media_id:     Uuid,
  pub title:        String,
  pub owner_id:     String,
  pub flags:        Vec<String>,
  pub report_count: u32,
}

// ─── Collaborator traits ─────────────────────────────────────────────────────

/// Directory lookup for the `admins` audience.
pub trait AdminDirectory: Send + Sync {
  fn active_admins(
    &self,
  ) -> impl Future<
    Output = Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>,
  > + Send;
}

/// A rendered message bound for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub recipient: String,
  pub subject:   String,
  pub body:      String,
}

/// External delivery transport (email, push — deployment-specific).
pub trait Transport: Send + Sync {
  fn send(
    &self,
    message: &Message,
  ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>>
  + Send;
}

// ─── Rendering ───────────────────────────────────────────────────────────────

fn render(intent: &NotificationIntent, recipient: &str) -> Message {
  let (subject, body) = match intent.template {
    TemplateKind::FlaggedForReview => (
      format!("Media flagged for review: {}", intent.title),
      format!(
        "\"{}\" was flagged by the classifier ({}) and is awaiting review.",
        intent.title,
        intent.flags.join(", "),
      ),
    ),
    TemplateKind::ContentRejected => (
      format!("Media rejected: {}", intent.title),
      format!(
        "\"{}\" (owner {}) has been rejected and is no longer publicly visible.",
        intent.title, intent.owner_id,
      ),
    ),
    TemplateKind::ReportThresholdReached => (
      format!("Report threshold reached: {}", intent.title),
      format!(
        "\"{}\" has received {} reports and has been escalated for review.",
        intent.title, intent.report_count,
      ),
    ),
  };

  Message { recipient: recipient.to_string(), subject, body }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Resolves intents to recipients and sends each message independently.
///
/// One recipient's failure never blocks the others, and no failure escapes
/// [`Dispatcher::dispatch`].
pub struct Dispatcher<D, T> {
  directory: D,
  transport: T,
  delivered: AtomicU64,
  failed:    AtomicU64,
}

impl<D: AdminDirectory, T: Transport> Dispatcher<D, T> {
  pub fn new(directory: D, transport: T) -> Self {
    Self {
      directory,
      transport,
      delivered: AtomicU64::new(0),
      failed: AtomicU64::new(0),
    }
  }

  /// `(delivered, failed)` counters since startup.
  pub fn counters(&self) -> (u64, u64) {
    (
      self.delivered.load(Ordering::Relaxed),
      self.failed.load(Ordering::Relaxed),
    )
  }

  pub async fn dispatch(&self, intent: &NotificationIntent) {
    let recipients = match intent.audience {
      Audience::Owner => vec![intent.owner_id.clone()],
      Audience::Admins => match self.directory.active_admins().await {
        Ok(admins) => admins,
        Err(e) => {
          tracing::warn!(
            media_id = %intent.media_id,
            template = ?intent.template,
            error = %e,
            "admin directory unavailable; intent dropped",
          );
          self.failed.fetch_add(1, Ordering::Relaxed);
          return;
        }
      },
    };

    for recipient in recipients {
      let message = render(intent, &recipient);
      match self.transport.send(&message).await {
        Ok(()) => {
          self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
          tracing::warn!(
            media_id = %intent.media_id,
            template = ?intent.template,
            %recipient,
            error = %e,
            "notification delivery failed",
          );
          self.failed.fetch_add(1, Ordering::Relaxed);
        }
      }
    }
  }
}

// ─── Notifier handle ─────────────────────────────────────────────────────────

/// Cloneable outbox handle the engine pushes committed intents into.
#[derive(Clone)]
pub struct Notifier {
  tx: mpsc::UnboundedSender<NotificationIntent>,
}

impl Notifier {
  pub fn new(tx: mpsc::UnboundedSender<NotificationIntent>) -> Self {
    Self { tx }
  }

  /// A notifier plus the raw receiver — used by tests to observe intents.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationIntent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  /// Hand off intents. The transition is already durable, so a closed
  /// channel only costs the notification, never the state.
  pub fn send_all(&self, intents: Vec<NotificationIntent>) {
    for intent in intents {
      if self.tx.send(intent).is_err() {
        tracing::warn!("notification dispatcher is gone; intent dropped");
      }
    }
  }
}

/// Spawn the drain task for `dispatcher`.
///
/// The task exits when every [`Notifier`] clone has been dropped.
pub fn spawn_dispatcher<D, T>(
  dispatcher: Arc<Dispatcher<D, T>>,
) -> (Notifier, tokio::task::JoinHandle<()>)
where
  D: AdminDirectory + 'static,
  T: Transport + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel::<NotificationIntent>();

  let handle = tokio::spawn(async move {
    while let Some(intent) = rx.recv().await {
      dispatcher.dispatch(&intent).await;
    }
  });

  (Notifier { tx }, handle)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;

  struct FixedDirectory(Vec<String>);

  impl AdminDirectory for FixedDirectory {
    async fn active_admins(
      &self,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
      Ok(self.0.clone())
    }
  }

  /// Records every send; fails for recipients in the deny list.
  struct RecordingTransport {
    sent: Mutex<Vec<Message>>,
    deny: Vec<String>,
  }

  impl RecordingTransport {
    fn new(deny: Vec<String>) -> Self {
      Self { sent: Mutex::new(Vec::new()), deny }
    }
  }

  impl Transport for RecordingTransport {
    async fn send(
      &self,
      message: &Message,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
      if self.deny.contains(&message.recipient) {
        return Err("smtp refused".into());
      }
      self.sent.lock().unwrap().push(message.clone());
      Ok(())
    }
  }

  fn intent(audience: Audience, template: TemplateKind) -> NotificationIntent {
    NotificationIntent {
      audience,
      template,
      media_id: Uuid::new_v4(),
      title: "Morning Sermon".into(),
      owner_id: "owner-1".into(),
      flags: vec!["explicit_language".into()],
      report_count: 3,
    }
  }

  #[tokio::test]
  async fn admins_audience_fans_out_to_every_admin() {
    let dispatcher = Dispatcher::new(
      FixedDirectory(vec!["a1".into(), "a2".into(), "a3".into()]),
      RecordingTransport::new(vec![]),
    );

    dispatcher
      .dispatch(&intent(Audience::Admins, TemplateKind::FlaggedForReview))
      .await;

    let sent = dispatcher.transport.sent.lock().unwrap();
    let recipients: Vec<_> = sent.iter().map(|m| m.recipient.clone()).collect();
    assert_eq!(recipients, ["a1", "a2", "a3"]);
    drop(sent);
    assert_eq!(dispatcher.counters(), (3, 0));
  }

  #[tokio::test]
  async fn one_failing_recipient_does_not_block_the_rest() {
    let dispatcher = Dispatcher::new(
      FixedDirectory(vec!["a1".into(), "a2".into(), "a3".into()]),
      RecordingTransport::new(vec!["a2".into()]),
    );

    dispatcher
      .dispatch(&intent(Audience::Admins, TemplateKind::ReportThresholdReached))
      .await;

    let sent = dispatcher.transport.sent.lock().unwrap();
    let recipients: Vec<_> = sent.iter().map(|m| m.recipient.clone()).collect();
    assert_eq!(recipients, ["a1", "a3"]);
    drop(sent);
    assert_eq!(dispatcher.counters(), (2, 1));
  }

  #[tokio::test]
  async fn owner_audience_resolves_to_the_single_owner() {
    let dispatcher = Dispatcher::new(
      FixedDirectory(vec!["a1".into()]),
      RecordingTransport::new(vec![]),
    );

    dispatcher
      .dispatch(&intent(Audience::Owner, TemplateKind::ContentRejected))
      .await;

    let sent = dispatcher.transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "owner-1");
    assert!(sent[0].body.contains("no longer publicly visible"));
  }

  struct BrokenDirectory;

  impl AdminDirectory for BrokenDirectory {
    async fn active_admins(
      &self,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
      Err("directory down".into())
    }
  }

  #[tokio::test]
  async fn directory_failure_drops_the_intent_without_panicking() {
    let dispatcher =
      Dispatcher::new(BrokenDirectory, RecordingTransport::new(vec![]));

    dispatcher
      .dispatch(&intent(Audience::Admins, TemplateKind::FlaggedForReview))
      .await;

    assert_eq!(dispatcher.counters(), (0, 1));
  }
}
