//! The Moderation Engine — the state machine that owns `status`.
//!
//! The transition table lives in [`plan`], a pure function over
//! (current status, event). The engine wraps it with storage access,
//! optimistic-concurrency retries, audit writes, and intent emission. No
//! other component writes a record's status.
//!
//! Ordering contract: the transition and its audit entry are committed in one
//! transaction, and only then are notification intents handed to the
//! [`Notifier`]. Delivery failure can never leave the record inconsistent.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{AuditAction, NewAuditEntry},
  classify::{ClassificationOutcome, Verdict},
  media::MediaItem,
  notify::{Audience, NotificationIntent, Notifier, TemplateKind},
  record::{Actor, ModerationRecord, ModerationStatus, SystemActor},
  store::{ModerationStore, TransitionUpdate},
};

/// How many times a compare-and-swap is retried before the caller sees
/// [`Error::Conflict`].
const CAS_RETRIES: usize = 3;

// ─── Events and the pure transition table ────────────────────────────────────

/// An event the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  /// A classifier verdict arrived.
  Classified(Verdict),
  /// `report_count` is at or above the configured threshold.
  ThresholdCrossed,
  /// An admin decided a new status.
  AdminDecision(ModerationStatus),
}

/// What [`plan`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Transition {
    next:   ModerationStatus,
    action: AuditAction,
    notify: Vec<(Audience, TemplateKind)>,
  },
  /// The event has no effect in the current state.
  NoOp,
}

/// The transition table.
///
/// Rules encoded here:
/// - a `clean` verdict silently approves only from `pending`;
/// - a `rejected` verdict applies from `pending` and `under_review`;
/// - no verdict ever moves a `rejected` record — only an admin can;
/// - the threshold crossing escalates only from `pending`/`approved`, which
///   makes it edge-triggered: once `under_review`, re-evaluation is a no-op;
/// - admin decisions are authoritative from any state (including the
///   `rejected → approved` override and the `rejected → under_review`
///   appeal), except that `pending` is not a decision target.
pub fn plan(current: ModerationStatus, event: Event) -> Outcome {
  use ModerationStatus::*;

  match event {
    Event::Classified(Verdict::Clean) => match current {
      Pending => Outcome::Transition {
        next:   Approved,
        action: AuditAction::ClassificationApplied,
        notify: vec![],
      },
      _ => Outcome::NoOp,
    },

    Event::Classified(Verdict::Flagged) => match current {
      Pending => Outcome::Transition {
        next:   UnderReview,
        action: AuditAction::ClassificationApplied,
        notify: vec![(Audience::Admins, TemplateKind::FlaggedForReview)],
      },
      _ => Outcome::NoOp,
    },

    Event::Classified(Verdict::Rejected) => match current {
      Pending | UnderReview => Outcome::Transition {
        next:   Rejected,
        action: AuditAction::ClassificationApplied,
        notify: vec![
          (Audience::Owner, TemplateKind::ContentRejected),
          (Audience::Admins, TemplateKind::ContentRejected),
        ],
      },
      _ => Outcome::NoOp,
    },

    Event::ThresholdCrossed => match current {
      Pending | Approved => Outcome::Transition {
        next:   UnderReview,
        action: AuditAction::ReportEscalation,
        notify: vec![(Audience::Admins, TemplateKind::ReportThresholdReached)],
      },
      UnderReview | Rejected => Outcome::NoOp,
    },

    Event::AdminDecision(decision) => {
      if decision == current || decision == Pending {
        return Outcome::NoOp;
      }
      let notify = match decision {
        Rejected => vec![(Audience::Owner, TemplateKind::ContentRejected)],
        // Approvals and manual holds notify nobody.
        _ => vec![],
      };
      Outcome::Transition {
        next: decision,
        action: AuditAction::AdminDecision,
        notify,
      }
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Input to [`ModerationEngine::apply_admin_decision`].
#[derive(Debug, Clone)]
pub struct AdminDecision {
  pub admin_id:      String,
  pub status:        ModerationStatus,
  pub admin_notes:   Option<String>,
  pub reason:        Option<String>,
  /// Explicit reset of the report counter alongside the decision.
  pub reset_reports: bool,
  pub ip_address:    Option<String>,
}

pub struct ModerationEngine<S> {
  store:     Arc<S>,
  notifier:  Notifier,
  threshold: u32,
}

impl<S> Clone for ModerationEngine<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      notifier:  self.notifier.clone(),
      threshold: self.threshold,
    }
  }
}

impl<S: ModerationStore> ModerationEngine<S> {
  pub fn new(store: Arc<S>, notifier: Notifier, threshold: u32) -> Self {
    Self { store, notifier, threshold }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn threshold(&self) -> u32 { self.threshold }

  async fn media(&self, media_id: Uuid) -> Result<MediaItem> {
    self
      .store
      .get_media(media_id)
      .await?
      .ok_or(Error::MediaNotFound(media_id))
  }

  async fn record(&self, media_id: Uuid) -> Result<ModerationRecord> {
    self
      .store
      .get_record(media_id)
      .await?
      .ok_or(Error::MediaNotFound(media_id))
  }

  fn emit(
    &self,
    media: &MediaItem,
    record: &ModerationRecord,
    notify: Vec<(Audience, TemplateKind)>,
  ) {
    let intents: Vec<NotificationIntent> = notify
      .into_iter()
      .map(|(audience, template)| NotificationIntent {
        audience,
        template,
        media_id: media.media_id,
        title: media.title.clone(),
        owner_id: media.owner_id.clone(),
        flags: record.flags.clone(),
        report_count: record.report_count,
      })
      .collect();
    self.notifier.send_all(intents);
  }

  // ── ApplyClassification ───────────────────────────────────────────────

  /// Apply a classifier verdict to a record.
  ///
  /// Idempotent under at-least-once delivery: re-applying the verdict the
  /// record already carries is a no-op. A verdict never moves a `rejected`
  /// record, and `clean` cannot approve a record that has left `pending`.
  /// New flags from a `flagged` verdict are merged even when the record is
  /// already `under_review`.
  pub async fn apply_classification(
    &self,
    media_id: Uuid,
    outcome: &ClassificationOutcome,
  ) -> Result<ModerationRecord> {
    let media = self.media(media_id).await?;
    let actor = Actor::System(SystemActor::Classifier);

    for _ in 0..CAS_RETRIES {
      let record = self.record(media_id).await?;

      if record.last_verdict == Some(outcome.verdict) {
        tracing::debug!(%media_id, verdict = outcome.verdict.as_str(),
          "verdict already applied; no-op");
        return Ok(record);
      }

      let (next, action, notify) =
        match plan(record.status, Event::Classified(outcome.verdict)) {
          Outcome::Transition { next, action, notify } => {
            (next, action, notify)
          }
          Outcome::NoOp => {
            // A flagged verdict landing on an already-escalated record
            // still contributes its flags; everything else is inert.
            if outcome.verdict == Verdict::Flagged
              && record.status == ModerationStatus::UnderReview
            {
              (record.status, AuditAction::ClassificationApplied, vec![])
            } else {
              return Ok(record);
            }
          }
        };

      let mut update =
        TransitionUpdate::new(media_id, record.status, next, actor.clone());
      update.add_flags = outcome.flags.clone();
      update.set_verdict = Some(outcome.verdict);

      let mut audit = NewAuditEntry::new(media_id, action, actor.clone());
      audit.metadata = json!({
        "from": record.status,
        "to": next,
        "verdict": outcome.verdict,
        "flags": outcome.flags,
      });

      match self.store.commit_transition(update, audit).await {
        Ok(written) => {
          tracing::info!(%media_id, from = %record.status, to = %next,
            verdict = outcome.verdict.as_str(), "classification applied");
          self.emit(&media, &written, notify);
          return Ok(written);
        }
        Err(Error::Conflict(_)) => continue,
        Err(e) => return Err(e),
      }
    }

    Err(Error::Conflict(media_id))
  }

  // ── EvaluateReportThreshold ───────────────────────────────────────────

  /// Re-evaluate the escalation rule after a report landed.
  ///
  /// Must be called strictly after the counter increment is visible.
  /// Returns the escalated record, or `None` when nothing happened — which
  /// is the common case once the record is already `under_review`
  /// (edge-triggered: the intent fires once per crossing, not per report).
  pub async fn evaluate_report_threshold(
    &self,
    media_id: Uuid,
  ) -> Result<Option<ModerationRecord>> {
    let media = self.media(media_id).await?;
    let actor = Actor::System(SystemActor::ReportThreshold);

    for _ in 0..CAS_RETRIES {
      let record = self.record(media_id).await?;

      if record.report_count < self.threshold {
        return Ok(None);
      }

      let (next, action, notify) =
        match plan(record.status, Event::ThresholdCrossed) {
          Outcome::Transition { next, action, notify } => {
            (next, action, notify)
          }
          Outcome::NoOp => return Ok(None),
        };

      let update =
        TransitionUpdate::new(media_id, record.status, next, actor.clone());

      let mut audit = NewAuditEntry::new(media_id, action, actor.clone());
      audit.metadata = json!({
        "from": record.status,
        "to": next,
        "report_count": record.report_count,
        "threshold": self.threshold,
      });

      match self.store.commit_transition(update, audit).await {
        Ok(written) => {
          tracing::info!(%media_id, report_count = written.report_count,
            "report threshold crossed; escalated for review");
          self.emit(&media, &written, notify);
          return Ok(Some(written));
        }
        Err(Error::Conflict(_)) => continue,
        Err(e) => return Err(e),
      }
    }

    Err(Error::Conflict(media_id))
  }

  // ── ApplyAdminDecision ────────────────────────────────────────────────

  /// Apply an admin decision, authoritative from any state.
  ///
  /// Deciding the status the record already has fails with
  /// [`Error::NoChange`] so accidental double-submits do not pollute the
  /// audit trail; `pending` is not a valid decision target.
  pub async fn apply_admin_decision(
    &self,
    media_id: Uuid,
    decision: AdminDecision,
  ) -> Result<ModerationRecord> {
    if decision.status == ModerationStatus::Pending {
      return Err(Error::InvalidDecision(decision.status));
    }

    let media = self.media(media_id).await?;
    let actor = Actor::admin(&decision.admin_id);

    for _ in 0..CAS_RETRIES {
      let record = self.record(media_id).await?;

      if record.status == decision.status {
        return Err(Error::NoChange {
          media_id,
          status: record.status,
        });
      }

      let (next, action, notify) =
        match plan(record.status, Event::AdminDecision(decision.status)) {
          Outcome::Transition { next, action, notify } => {
            (next, action, notify)
          }
          // Unreachable given the guards above; treat as no change.
          Outcome::NoOp => {
            return Err(Error::NoChange { media_id, status: record.status });
          }
        };

      let mut update =
        TransitionUpdate::new(media_id, record.status, next, actor.clone());
      update.admin_notes = decision.admin_notes.clone();
      update.reset_report_count = decision.reset_reports;

      let mut audit = NewAuditEntry::new(media_id, action, actor.clone());
      audit.reason = decision.reason.clone();
      audit.ip_address = decision.ip_address.clone();
      audit.metadata = json!({
        "from": record.status,
        "to": next,
        "reset_reports": decision.reset_reports,
      });

      match self.store.commit_transition(update, audit).await {
        Ok(written) => {
          tracing::info!(%media_id, admin = %decision.admin_id,
            from = %record.status, to = %next, "admin decision applied");
          self.emit(&media, &written, notify);
          return Ok(written);
        }
        Err(Error::Conflict(_)) => continue,
        Err(e) => return Err(e),
      }
    }

    Err(Error::Conflict(media_id))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
