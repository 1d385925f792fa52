//! The Report Aggregator — validates and records user reports.
//!
//! The aggregator owns report rows and the counting logic, but the
//! consequence of crossing the threshold belongs to the engine: after the
//! atomic insert-and-increment it simply asks the engine to re-evaluate.

use crate::{
  Error, Result,
  engine::ModerationEngine,
  report::{NewReport, ReportEntry},
  store::ModerationStore,
};

/// The outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmittedReport {
  pub report:       ReportEntry,
  /// The media's report count after this report.
  pub report_count: u32,
  /// Whether this report pushed the record into review.
  pub escalated:    bool,
}

pub struct ReportAggregator<S> {
  engine: ModerationEngine<S>,
}

impl<S> Clone for ReportAggregator<S> {
  fn clone(&self) -> Self { Self { engine: self.engine.clone() } }
}

impl<S: ModerationStore> ReportAggregator<S> {
  pub fn new(engine: ModerationEngine<S>) -> Self { Self { engine } }

  /// Submit one report.
  ///
  /// Fails with [`Error::SelfReport`] when the reporter owns the media,
  /// [`Error::DuplicateReport`] when they already reported it (a reporter
  /// gets exactly one vote), and [`Error::DescriptionTooLong`] on oversized
  /// descriptions. On success the entry is durable, the counter has been
  /// incremented atomically, and the threshold rule has been re-evaluated.
  pub async fn submit(&self, input: NewReport) -> Result<SubmittedReport> {
    input.validate()?;

    let media_id = input.media_id;
    let media = self
      .engine
      .store()
      .get_media(media_id)
      .await?
      .ok_or(Error::MediaNotFound(media_id))?;

    if media.owner_id == input.reporter_id {
      return Err(Error::SelfReport {
        media_id,
        reporter_id: input.reporter_id,
      });
    }

    let (report, report_count) =
      self.engine.store().insert_report(input).await?;

    tracing::info!(%media_id, reporter = %report.reporter_id,
      reason = ?report.reason, report_count, "report recorded");

    let escalated = self
      .engine
      .evaluate_report_threshold(media_id)
      .await?
      .is_some();

    Ok(SubmittedReport { report, report_count, escalated })
  }
}
