//! Integration tests for `SqliteStore` against an in-memory database,
//! driving it through the engine and aggregator the way the service does.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use uuid::Uuid;
use warden_core::{
  aggregator::ReportAggregator,
  audit::{AuditAction, AuditQuery},
  classify::{
    ClassificationAdapter, ClassificationOutcome, Verdict, spawn_consumer,
  },
  engine::{AdminDecision, ModerationEngine},
  media::{MediaItem, NewMedia},
  notify::{Audience, NotificationIntent, Notifier, TemplateKind},
  record::{Actor, ModerationStatus},
  report::{NewReport, ReportReason, ReportStatus},
  store::{ModerationStore, QueueQuery},
};

use crate::SqliteStore;

const THRESHOLD: u32 = 3;

async fn harness() -> (
  SqliteStore,
  ModerationEngine<SqliteStore>,
  ReportAggregator<SqliteStore>,
  mpsc::UnboundedReceiver<NotificationIntent>,
) {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  let (notifier, rx) = Notifier::channel();
  let engine =
    ModerationEngine::new(Arc::new(store.clone()), notifier, THRESHOLD);
  let aggregator = ReportAggregator::new(engine.clone());
  (store, engine, aggregator, rx)
}

async fn media(store: &SqliteStore, owner: &str) -> Uuid {
  store
    .register_media(NewMedia {
      owner_id: owner.into(),
      title:    "Morning Sermon".into(),
    })
    .await
    .unwrap()
    .media_id
}

fn drain(
  rx: &mut mpsc::UnboundedReceiver<NotificationIntent>,
) -> Vec<NotificationIntent> {
  let mut intents = Vec::new();
  while let Ok(intent) = rx.try_recv() {
    intents.push(intent);
  }
  intents
}

fn outcome(verdict: Verdict, flags: &[&str]) -> ClassificationOutcome {
  ClassificationOutcome {
    verdict,
    flags: flags.iter().map(|s| s.to_string()).collect(),
    transcript: None,
  }
}

fn report(media_id: Uuid, reporter: &str) -> NewReport {
  NewReport {
    media_id,
    reporter_id: reporter.into(),
    reason: ReportReason::ExplicitLanguage,
    description: None,
  }
}

// ─── Media registry ──────────────────────────────────────────────────────────

#[tokio::test]
async fn register_media_creates_pending_record() {
  let (store, _, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let item = store.get_media(id).await.unwrap().unwrap();
  assert_eq!(item.owner_id, "owner-1");

  let record = store.get_record(id).await.unwrap().unwrap();
  assert_eq!(record.status, ModerationStatus::Pending);
  assert_eq!(record.report_count, 0);
  assert!(record.flags.is_empty());
  assert!(record.is_visible());
}

#[tokio::test]
async fn get_media_missing_returns_none() {
  let (store, _, _, _rx) = harness().await;
  assert!(store.get_media(Uuid::new_v4()).await.unwrap().is_none());
  assert!(store.get_record(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Classification ──────────────────────────────────────────────────────────

#[tokio::test]
async fn clean_verdict_approves_silently() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let record = engine
    .apply_classification(id, &outcome(Verdict::Clean, &[]))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::Approved);
  assert_eq!(record.last_verdict, Some(Verdict::Clean));
  assert!(drain(&mut rx).is_empty(), "silent pass must not notify");

  let audits = store
    .list_audit(AuditQuery { subject_id: Some(id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(audits.len(), 1);
  assert_eq!(audits[0].action, AuditAction::ClassificationApplied);
  assert_eq!(audits[0].actor.encode(), "system:classifier");
}

#[tokio::test]
async fn flagged_verdict_escalates_and_notifies_admins() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let record = engine
    .apply_classification(id, &outcome(Verdict::Flagged, &["explicit_language"]))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::UnderReview);
  assert_eq!(record.flags, ["explicit_language"]);

  let intents = drain(&mut rx);
  assert_eq!(intents.len(), 1);
  assert_eq!(intents[0].audience, Audience::Admins);
  assert_eq!(intents[0].template, TemplateKind::FlaggedForReview);
  assert_eq!(intents[0].media_id, id);
}

#[tokio::test]
async fn rejected_verdict_hides_media_and_notifies_owner_and_admins() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let record = engine
    .apply_classification(id, &outcome(Verdict::Rejected, &["sexual_content"]))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::Rejected);
  assert!(!record.is_visible());

  let intents = drain(&mut rx);
  let audiences: Vec<_> = intents.iter().map(|i| i.audience).collect();
  assert!(audiences.contains(&Audience::Owner));
  assert!(audiences.contains(&Audience::Admins));
  assert!(
    intents
      .iter()
      .all(|i| i.template == TemplateKind::ContentRejected)
  );
}

#[tokio::test]
async fn reapplying_the_same_verdict_is_a_noop() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_classification(id, &outcome(Verdict::Flagged, &["spam"]))
    .await
    .unwrap();
  drain(&mut rx);

  // At-least-once delivery: the duplicate must change nothing.
  let record = engine
    .apply_classification(id, &outcome(Verdict::Flagged, &["spam"]))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::UnderReview);
  assert!(drain(&mut rx).is_empty());

  let audits = store
    .list_audit(AuditQuery { subject_id: Some(id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(audits.len(), 1, "duplicate verdict must not add audit entries");
}

#[tokio::test]
async fn verdict_never_downgrades_a_rejected_record() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_classification(id, &outcome(Verdict::Rejected, &[]))
    .await
    .unwrap();
  drain(&mut rx);

  let record = engine
    .apply_classification(id, &outcome(Verdict::Clean, &[]))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::Rejected);
  assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn flagged_verdict_on_reviewed_record_accumulates_flags() {
  let (store, engine, aggregator, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  // Escalate via reports first.
  for reporter in ["a", "b", "c"] {
    aggregator.submit(report(id, reporter)).await.unwrap();
  }
  drain(&mut rx);

  let record = engine
    .apply_classification(id, &outcome(Verdict::Flagged, &["explicit_language"]))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::UnderReview);
  assert_eq!(record.flags, ["explicit_language"]);
  assert!(drain(&mut rx).is_empty(), "no second escalation notification");
}

// ─── Transition CAS ──────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_transition_rejects_a_stale_expected_status() {
  use warden_core::{audit::NewAuditEntry, store::TransitionUpdate};

  let (store, _, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  // The record is still pending; a writer that read under_review lost the
  // race and must see a conflict, not silently clobber the row.
  let update = TransitionUpdate::new(
    id,
    ModerationStatus::UnderReview,
    ModerationStatus::Approved,
    Actor::admin("carol"),
  );
  let audit =
    NewAuditEntry::new(id, AuditAction::AdminDecision, Actor::admin("carol"));

  let err = store.commit_transition(update, audit).await.unwrap_err();
  assert!(matches!(err, warden_core::Error::Conflict(conflicted) if conflicted == id));

  // The losing write left nothing behind: status unchanged, no audit row.
  assert_eq!(
    store.get_record(id).await.unwrap().unwrap().status,
    ModerationStatus::Pending,
  );
  let audits = store
    .list_audit(AuditQuery { subject_id: Some(id), ..Default::default() })
    .await
    .unwrap();
  assert!(audits.is_empty());
}

#[tokio::test]
async fn commit_transition_on_unknown_media_fails() {
  use warden_core::{audit::NewAuditEntry, store::TransitionUpdate};

  let (store, _, _, _rx) = harness().await;
  let id = Uuid::new_v4();

  let update = TransitionUpdate::new(
    id,
    ModerationStatus::Pending,
    ModerationStatus::Approved,
    Actor::admin("carol"),
  );
  let audit =
    NewAuditEntry::new(id, AuditAction::AdminDecision, Actor::admin("carol"));

  let err = store.commit_transition(update, audit).await.unwrap_err();
  assert!(matches!(err, warden_core::Error::MediaNotFound(_)));
}

// ─── Report submission ───────────────────────────────────────────────────────

#[tokio::test]
async fn self_report_is_rejected_without_side_effects() {
  let (store, _, aggregator, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let err = aggregator.submit(report(id, "owner-1")).await.unwrap_err();
  assert!(matches!(err, warden_core::Error::SelfReport { .. }));

  assert!(store.list_reports(id).await.unwrap().is_empty());
  assert_eq!(store.get_record(id).await.unwrap().unwrap().report_count, 0);
}

#[tokio::test]
async fn duplicate_report_is_rejected_and_counted_once() {
  let (store, _, aggregator, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  aggregator.submit(report(id, "alice")).await.unwrap();
  let err = aggregator.submit(report(id, "alice")).await.unwrap_err();
  assert!(matches!(err, warden_core::Error::DuplicateReport { .. }));

  assert_eq!(store.list_reports(id).await.unwrap().len(), 1);
  assert_eq!(store.get_record(id).await.unwrap().unwrap().report_count, 1);
}

#[tokio::test]
async fn report_on_unknown_media_fails() {
  let (_, _, aggregator, _rx) = harness().await;
  let err = aggregator
    .submit(report(Uuid::new_v4(), "alice"))
    .await
    .unwrap_err();
  assert!(matches!(err, warden_core::Error::MediaNotFound(_)));
}

#[tokio::test]
async fn oversized_description_is_rejected() {
  let (store, _, aggregator, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let mut input = report(id, "alice");
  input.description = Some("x".repeat(1001));

  let err = aggregator.submit(input).await.unwrap_err();
  assert!(matches!(err, warden_core::Error::DescriptionTooLong { .. }));
  assert!(store.list_reports(id).await.unwrap().is_empty());
}

// ─── Threshold escalation ────────────────────────────────────────────────────

#[tokio::test]
async fn crossing_the_threshold_escalates_exactly_once() {
  let (store, _, aggregator, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let first = aggregator.submit(report(id, "a")).await.unwrap();
  let second = aggregator.submit(report(id, "b")).await.unwrap();
  assert!(!first.escalated && !second.escalated);
  assert!(drain(&mut rx).is_empty());

  let third = aggregator.submit(report(id, "c")).await.unwrap();
  assert!(third.escalated);
  assert_eq!(third.report_count, 3);

  let record = store.get_record(id).await.unwrap().unwrap();
  assert_eq!(record.status, ModerationStatus::UnderReview);

  let intents = drain(&mut rx);
  assert_eq!(intents.len(), 1);
  assert_eq!(intents[0].template, TemplateKind::ReportThresholdReached);
  assert_eq!(intents[0].report_count, 3);

  // A fourth report increments the count but is edge-triggered: no new
  // escalation, no new intent.
  let fourth = aggregator.submit(report(id, "d")).await.unwrap();
  assert!(!fourth.escalated);
  assert_eq!(fourth.report_count, 4);
  assert_eq!(
    store.get_record(id).await.unwrap().unwrap().status,
    ModerationStatus::UnderReview,
  );
  assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn reports_below_threshold_leave_the_record_pending() {
  let (store, _, aggregator, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  aggregator.submit(report(id, "a")).await.unwrap();
  aggregator.submit(report(id, "b")).await.unwrap();

  let record = store.get_record(id).await.unwrap().unwrap();
  assert_eq!(record.status, ModerationStatus::Pending);
  assert_eq!(record.report_count, 2);
  assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn threshold_never_escalates_rejected_media() {
  let (store, engine, aggregator, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_classification(id, &outcome(Verdict::Rejected, &[]))
    .await
    .unwrap();
  drain(&mut rx);

  for reporter in ["a", "b", "c"] {
    let submitted = aggregator.submit(report(id, reporter)).await.unwrap();
    assert!(!submitted.escalated);
  }

  assert_eq!(
    store.get_record(id).await.unwrap().unwrap().status,
    ModerationStatus::Rejected,
  );
  assert!(drain(&mut rx).is_empty());
}

// ─── Admin decisions ─────────────────────────────────────────────────────────

fn decision(admin: &str, status: ModerationStatus) -> AdminDecision {
  AdminDecision {
    admin_id:      admin.into(),
    status,
    admin_notes:   None,
    reason:        None,
    reset_reports: false,
    ip_address:    None,
  }
}

#[tokio::test]
async fn admin_approval_ends_review_without_notifications() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_classification(id, &outcome(Verdict::Flagged, &["spam"]))
    .await
    .unwrap();
  drain(&mut rx);

  let record = engine
    .apply_admin_decision(id, decision("carol", ModerationStatus::Approved))
    .await
    .unwrap();

  assert_eq!(record.status, ModerationStatus::Approved);
  assert!(drain(&mut rx).is_empty());

  let audits = store
    .list_audit(AuditQuery {
      subject_id: Some(id),
      actor: Some("admin:carol".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(audits.len(), 1);
  assert_eq!(audits[0].action, AuditAction::AdminDecision);
}

#[tokio::test]
async fn admin_rejection_notifies_the_owner() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_classification(id, &outcome(Verdict::Flagged, &[]))
    .await
    .unwrap();
  drain(&mut rx);

  let mut d = decision("carol", ModerationStatus::Rejected);
  d.admin_notes = Some("explicit language confirmed".into());
  let record = engine.apply_admin_decision(id, d).await.unwrap();

  assert_eq!(record.status, ModerationStatus::Rejected);
  assert_eq!(record.admin_notes.as_deref(), Some("explicit language confirmed"));
  assert!(!record.is_visible());

  let intents = drain(&mut rx);
  assert_eq!(intents.len(), 1);
  assert_eq!(intents[0].audience, Audience::Owner);
  assert_eq!(intents[0].template, TemplateKind::ContentRejected);
}

#[tokio::test]
async fn admin_can_override_a_rejected_record() {
  let (store, engine, _, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_classification(id, &outcome(Verdict::Rejected, &[]))
    .await
    .unwrap();
  drain(&mut rx);

  let mut d = decision("carol", ModerationStatus::Approved);
  d.reason = Some("override".into());
  let record = engine.apply_admin_decision(id, d).await.unwrap();

  assert_eq!(record.status, ModerationStatus::Approved);
  assert!(record.is_visible());
  assert_eq!(record.last_transition_by, Actor::admin("carol"));

  let audits = store
    .list_audit(AuditQuery {
      subject_id: Some(id),
      actor: Some("admin:carol".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(audits.len(), 1);
  assert_eq!(audits[0].reason.as_deref(), Some("override"));
}

#[tokio::test]
async fn admin_decision_to_current_status_is_rejected() {
  let (store, engine, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  engine
    .apply_admin_decision(id, decision("carol", ModerationStatus::UnderReview))
    .await
    .unwrap();

  let err = engine
    .apply_admin_decision(id, decision("carol", ModerationStatus::UnderReview))
    .await
    .unwrap_err();
  assert!(matches!(err, warden_core::Error::NoChange { .. }));

  // The rejected double-submit leaves exactly one audit entry behind.
  let audits = store
    .list_audit(AuditQuery { subject_id: Some(id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(audits.len(), 1);
}

#[tokio::test]
async fn admin_cannot_decide_pending() {
  let (store, engine, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let err = engine
    .apply_admin_decision(id, decision("carol", ModerationStatus::Pending))
    .await
    .unwrap_err();
  assert!(matches!(err, warden_core::Error::InvalidDecision(_)));
}

#[tokio::test]
async fn admin_reset_clears_the_report_counter() {
  let (store, engine, aggregator, mut rx) = harness().await;
  let id = media(&store, "owner-1").await;

  for reporter in ["a", "b", "c"] {
    aggregator.submit(report(id, reporter)).await.unwrap();
  }
  drain(&mut rx);

  let mut d = decision("carol", ModerationStatus::Approved);
  d.reset_reports = true;
  let record = engine.apply_admin_decision(id, d).await.unwrap();

  assert_eq!(record.status, ModerationStatus::Approved);
  assert_eq!(record.report_count, 0);

  // Report entries themselves are never deleted.
  assert_eq!(store.list_reports(id).await.unwrap().len(), 3);
}

// ─── Report review ───────────────────────────────────────────────────────────

#[tokio::test]
async fn report_review_updates_status_independently_of_the_record() {
  use warden_core::audit::NewAuditEntry;

  let (store, _, aggregator, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let submitted = aggregator.submit(report(id, "alice")).await.unwrap();
  assert_eq!(submitted.report.status, ReportStatus::Pending);

  let audit = NewAuditEntry::new(
    submitted.report.report_id,
    AuditAction::ReportReviewed,
    Actor::admin("carol"),
  );
  let reviewed = store
    .set_report_status(submitted.report.report_id, ReportStatus::Dismissed, audit)
    .await
    .unwrap();

  assert_eq!(reviewed.status, ReportStatus::Dismissed);
  // The media record is untouched by report review.
  assert_eq!(
    store.get_record(id).await.unwrap().unwrap().status,
    ModerationStatus::Pending,
  );

  let audits = store
    .list_audit(AuditQuery {
      subject_id: Some(submitted.report.report_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(audits.len(), 1);
  assert_eq!(audits[0].action, AuditAction::ReportReviewed);
}

#[tokio::test]
async fn reviewing_an_unknown_report_fails() {
  use warden_core::audit::NewAuditEntry;

  let (store, _, _, _rx) = harness().await;
  let audit = NewAuditEntry::new(
    Uuid::new_v4(),
    AuditAction::ReportReviewed,
    Actor::admin("carol"),
  );
  let err = store
    .set_report_status(Uuid::new_v4(), ReportStatus::Reviewed, audit)
    .await
    .unwrap_err();
  assert!(matches!(err, warden_core::Error::ReportNotFound(_)));
}

// ─── Classification consumer ─────────────────────────────────────────────────

struct FixedAdapter(Verdict);

impl ClassificationAdapter for FixedAdapter {
  async fn classify(
    &self,
    _media: &MediaItem,
  ) -> Result<ClassificationOutcome, Box<dyn std::error::Error + Send + Sync>>
  {
    Ok(outcome(self.0, &[]))
  }
}

struct StalledAdapter;

impl ClassificationAdapter for StalledAdapter {
  async fn classify(
    &self,
    _media: &MediaItem,
  ) -> Result<ClassificationOutcome, Box<dyn std::error::Error + Send + Sync>>
  {
    std::future::pending().await
  }
}

#[tokio::test]
async fn consumer_applies_the_verdict_out_of_band() {
  let (store, engine, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let (queue, _task) = spawn_consumer(
    engine.clone(),
    Arc::new(FixedAdapter(Verdict::Clean)),
    Duration::from_secs(5),
  );
  queue.enqueue(id);

  let mut status = ModerationStatus::Pending;
  for _ in 0..100 {
    status = store.get_record(id).await.unwrap().unwrap().status;
    if status != ModerationStatus::Pending {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert_eq!(status, ModerationStatus::Approved);
}

#[tokio::test]
async fn consumer_timeout_leaves_the_record_pending() {
  let (store, engine, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let (queue, _task) = spawn_consumer(
    engine.clone(),
    Arc::new(StalledAdapter),
    Duration::from_millis(20),
  );
  queue.enqueue(id);
  tokio::time::sleep(Duration::from_millis(150)).await;

  // Neither fail-open nor fail-closed: the record waits for an admin.
  assert_eq!(
    store.get_record(id).await.unwrap().unwrap().status,
    ModerationStatus::Pending,
  );
}

// ─── Admin read views ────────────────────────────────────────────────────────

#[tokio::test]
async fn queue_filters_by_status() {
  let (store, engine, _, _rx) = harness().await;

  let approved = media(&store, "owner-1").await;
  let flagged = media(&store, "owner-2").await;
  let _untouched = media(&store, "owner-3").await;

  engine
    .apply_classification(approved, &outcome(Verdict::Clean, &[]))
    .await
    .unwrap();
  engine
    .apply_classification(flagged, &outcome(Verdict::Flagged, &["spam"]))
    .await
    .unwrap();

  let under_review = store
    .list_queue(QueueQuery {
      status: Some(ModerationStatus::UnderReview),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(under_review.len(), 1);
  assert_eq!(under_review[0].record.media_id, flagged);
  assert_eq!(under_review[0].media.owner_id, "owner-2");

  let all = store.list_queue(QueueQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn queue_respects_limit_and_offset() {
  let (store, _, _, _rx) = harness().await;
  for i in 0..5 {
    media(&store, &format!("owner-{i}")).await;
  }

  let page = store
    .list_queue(QueueQuery {
      status: None,
      limit:  Some(2),
      offset: Some(2),
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn stale_pending_view_surfaces_unclassified_media() {
  let (store, engine, _, _rx) = harness().await;

  let stale = media(&store, "owner-1").await;
  let handled = media(&store, "owner-2").await;
  engine
    .apply_classification(handled, &outcome(Verdict::Clean, &[]))
    .await
    .unwrap();

  let cutoff = chrono::Utc::now() + chrono::Duration::seconds(1);
  let view = store.list_stale_pending(cutoff).await.unwrap();

  assert_eq!(view.len(), 1);
  assert_eq!(view[0].record.media_id, stale);
}

#[tokio::test]
async fn standalone_audit_entries_are_persisted() {
  use warden_core::audit::NewAuditEntry;

  let (store, _, _, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  let mut entry =
    NewAuditEntry::new(id, AuditAction::AdminDecision, Actor::admin("carol"));
  entry.reason = Some("manual spot check, no status change".into());

  let written = store.record_audit(entry).await.unwrap();
  assert_eq!(written.subject_id, id);
  assert_eq!(written.actor, Actor::admin("carol"));

  let listed = store
    .list_audit(AuditQuery { subject_id: Some(id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].audit_id, written.audit_id);
}

#[tokio::test]
async fn audit_log_filters_by_actor_and_subject() {
  let (store, engine, aggregator, _rx) = harness().await;
  let id = media(&store, "owner-1").await;

  for reporter in ["a", "b", "c"] {
    aggregator.submit(report(id, reporter)).await.unwrap();
  }
  engine
    .apply_admin_decision(id, decision("carol", ModerationStatus::Rejected))
    .await
    .unwrap();

  let all = store
    .list_audit(AuditQuery { subject_id: Some(id), ..Default::default() })
    .await
    .unwrap();
  // One escalation + one admin decision.
  assert_eq!(all.len(), 2);

  let escalations = store
    .list_audit(AuditQuery {
      subject_id: Some(id),
      actor: Some("system:report-threshold".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(escalations.len(), 1);
  assert_eq!(escalations[0].action, AuditAction::ReportEscalation);
}
