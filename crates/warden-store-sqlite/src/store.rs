//! [`SqliteStore`] — the SQLite implementation of [`ModerationStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use warden_core::{
  audit::{AuditEntry, AuditQuery, NewAuditEntry},
  media::{MediaItem, NewMedia},
  record::ModerationRecord,
  report::{NewReport, ReportEntry, ReportStatus},
  store::{ModerationStore, QueueItem, QueueQuery, TransitionUpdate},
};

use crate::{
  Error,
  encode::{
    RawAudit, RawMedia, RawRecord, RawReport, encode_dt, encode_report_status,
    encode_reason, encode_status, encode_uuid, encode_verdict, merge_flags,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Warden moderation store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of the compare-and-swap transition, smuggled out of the
/// `conn.call` closure so domain errors keep their type.
enum CommitOutcome {
  Written(RawRecord),
  Conflict,
  NotFound,
}

enum InsertOutcome {
  Inserted(Box<RawReport>, i64),
  Duplicate,
  MediaMissing,
}

enum ReviewOutcome {
  Updated(Box<RawReport>),
  NotFound,
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
  Ok(RawRecord {
    media_id:           row.get(0)?,
    status:             row.get(1)?,
    flags:              row.get(2)?,
    report_count:       row.get(3)?,
    admin_notes:        row.get(4)?,
    last_verdict:       row.get(5)?,
    last_transition_at: row.get(6)?,
    last_transition_by: row.get(7)?,
  })
}

fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawReport> {
  Ok(RawReport {
    report_id:   row.get(0)?,
    media_id:    row.get(1)?,
    reporter_id: row.get(2)?,
    reason:      row.get(3)?,
    description: row.get(4)?,
    status:      row.get(5)?,
    created_at:  row.get(6)?,
  })
}

fn other(e: impl std::error::Error + Send + Sync + 'static) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// LIMIT/OFFSET bind as i64; out-of-range caller values pin to the maximum
/// instead of wrapping negative.
fn clamp_i64(v: usize) -> i64 { i64::try_from(v).unwrap_or(i64::MAX) }

const RECORD_COLS: &str = "media_id, status, flags, report_count, admin_notes, \
   last_verdict, last_transition_at, last_transition_by";

const REPORT_COLS: &str =
  "report_id, media_id, reporter_id, reason, description, status, created_at";

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self, Error> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<(), Error> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert an audit row inside an open transaction.
  fn append_audit(
    tx: &rusqlite::Transaction<'_>,
    entry: &NewAuditEntry,
    now_str: &str,
  ) -> Result<RawAudit, tokio_rusqlite::Error> {
    let raw = RawAudit {
      audit_id:    encode_uuid(Uuid::new_v4()),
      subject_id:  encode_uuid(entry.subject_id),
      action:      entry.action.as_str().to_string(),
      actor:       entry.actor.encode(),
      reason:      entry.reason.clone(),
      metadata:    entry.metadata.to_string(),
      ip_address:  entry.ip_address.clone(),
      recorded_at: now_str.to_string(),
    };

    tx.execute(
      "INSERT INTO audit_entries (
         audit_id, subject_id, action, actor, reason, metadata,
         ip_address, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        raw.audit_id,
        raw.subject_id,
        raw.action,
        raw.actor,
        raw.reason,
        raw.metadata,
        raw.ip_address,
        raw.recorded_at,
      ],
    )?;

    Ok(raw)
  }
}

// ─── ModerationStore impl ────────────────────────────────────────────────────

impl ModerationStore for SqliteStore {
  // ── Media registry ──────────────────────────────────────────────────────

  async fn register_media(
    &self,
    input: NewMedia,
  ) -> Result<MediaItem, warden_core::Error> {
    let media = MediaItem {
      media_id:   Uuid::new_v4(),
      owner_id:   input.owner_id,
      title:      input.title,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(media.media_id);
    let owner     = media.owner_id.clone();
    let title     = media.title.clone();
    let at_str    = encode_dt(media.created_at);
    let actor_str = "system:classifier".to_string();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO media_items (media_id, owner_id, title, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, owner, title, at_str],
        )?;
        // The record is born pending, attributed to the classifier that
        // will (eventually) move it.
        tx.execute(
          "INSERT INTO moderation_records
             (media_id, status, flags, report_count,
              last_transition_at, last_transition_by)
           VALUES (?1, 'pending', '[]', 0, ?2, ?3)",
          rusqlite::params![id_str, at_str, actor_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;

    Ok(media)
  }

  async fn get_media(
    &self,
    media_id: Uuid,
  ) -> Result<Option<MediaItem>, warden_core::Error> {
    let id_str = encode_uuid(media_id);

    let raw: Option<RawMedia> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT media_id, owner_id, title, created_at
               FROM media_items WHERE media_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawMedia {
                  media_id:   row.get(0)?,
                  owner_id:   row.get(1)?,
                  title:      row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)?;

    Ok(raw.map(RawMedia::into_media).transpose()?)
  }

  // ── Moderation records ──────────────────────────────────────────────────

  async fn get_record(
    &self,
    media_id: Uuid,
  ) -> Result<Option<ModerationRecord>, warden_core::Error> {
    let id_str = encode_uuid(media_id);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RECORD_COLS} FROM moderation_records WHERE media_id = ?1"
              ),
              rusqlite::params![id_str],
              record_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)?;

    Ok(raw.map(RawRecord::into_record).transpose()?)
  }

  async fn commit_transition(
    &self,
    update: TransitionUpdate,
    audit: NewAuditEntry,
  ) -> Result<ModerationRecord, warden_core::Error> {
    let media_id     = update.media_id;
    let id_str       = encode_uuid(media_id);
    let expected     = encode_status(update.expected_status).to_string();
    let new_status   = encode_status(update.new_status).to_string();
    let add_flags    = update.add_flags;
    let admin_notes  = update.admin_notes;
    let set_verdict  = update.set_verdict.map(encode_verdict).map(str::to_string);
    let reset_count  = update.reset_report_count;
    let actor_str    = update.actor.encode();
    let now_str      = encode_dt(Utc::now());

    let outcome: CommitOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(String, String)> = tx
          .query_row(
            "SELECT status, flags FROM moderation_records WHERE media_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let (status, flags_json) = match row {
          Some(r) => r,
          None => return Ok(CommitOutcome::NotFound),
        };

        // The compare half of the CAS: a concurrent writer moved the
        // status, so the caller must re-read and re-plan.
        if status != expected {
          return Ok(CommitOutcome::Conflict);
        }

        let existing: Vec<String> =
          serde_json::from_str(&flags_json).map_err(other)?;
        let merged = merge_flags(existing, &add_flags);
        let merged_json = serde_json::to_string(&merged).map_err(other)?;

        tx.execute(
          "UPDATE moderation_records SET
             status             = ?2,
             flags              = ?3,
             admin_notes        = COALESCE(?4, admin_notes),
             last_verdict       = COALESCE(?5, last_verdict),
             report_count       = CASE WHEN ?6 THEN 0 ELSE report_count END,
             last_transition_at = ?7,
             last_transition_by = ?8
           WHERE media_id = ?1",
          rusqlite::params![
            id_str,
            new_status,
            merged_json,
            admin_notes,
            set_verdict,
            reset_count,
            now_str,
            actor_str,
          ],
        )?;

        Self::append_audit(&tx, &audit, &now_str)?;

        let raw = tx.query_row(
          &format!(
            "SELECT {RECORD_COLS} FROM moderation_records WHERE media_id = ?1"
          ),
          rusqlite::params![id_str],
          record_from_row,
        )?;

        tx.commit()?;
        Ok(CommitOutcome::Written(raw))
      })
      .await
      .map_err(Error::from)?;

    match outcome {
      CommitOutcome::Written(raw) => Ok(raw.into_record()?),
      CommitOutcome::Conflict => Err(warden_core::Error::Conflict(media_id)),
      CommitOutcome::NotFound => {
        Err(warden_core::Error::MediaNotFound(media_id))
      }
    }
  }

  // ── Reports ─────────────────────────────────────────────────────────────

  async fn insert_report(
    &self,
    input: NewReport,
  ) -> Result<(ReportEntry, u32), warden_core::Error> {
    let media_id     = input.media_id;
    let reporter_id  = input.reporter_id.clone();
    let id_str       = encode_uuid(media_id);
    let report_id    = encode_uuid(Uuid::new_v4());
    let reporter     = input.reporter_id;
    let reason_str   = encode_reason(input.reason).to_string();
    let description  = input.description;
    let now_str      = encode_dt(Utc::now());

    let outcome: InsertOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let media_exists: bool = tx
          .query_row(
            "SELECT 1 FROM media_items WHERE media_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !media_exists {
          return Ok(InsertOutcome::MediaMissing);
        }

        let inserted = tx.execute(
          "INSERT INTO report_entries
             (report_id, media_id, reporter_id, reason, description,
              status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
          rusqlite::params![
            report_id,
            id_str,
            reporter,
            reason_str,
            description,
            now_str,
          ],
        );

        match inserted {
          Ok(_) => {}
          // UNIQUE (media_id, reporter_id): one vote per reporter.
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            return Ok(InsertOutcome::Duplicate);
          }
          Err(e) => return Err(e.into()),
        }

        // Atomic increment plus a same-transaction read-back, so the
        // threshold rule always evaluates against the visible count.
        tx.execute(
          "UPDATE moderation_records SET report_count = report_count + 1
           WHERE media_id = ?1",
          rusqlite::params![id_str],
        )?;
        let count: i64 = tx.query_row(
          "SELECT report_count FROM moderation_records WHERE media_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;

        let raw = tx.query_row(
          &format!(
            "SELECT {REPORT_COLS} FROM report_entries WHERE report_id = ?1"
          ),
          rusqlite::params![report_id],
          report_from_row,
        )?;

        tx.commit()?;
        Ok(InsertOutcome::Inserted(Box::new(raw), count))
      })
      .await
      .map_err(Error::from)?;

    match outcome {
      InsertOutcome::Inserted(raw, count) => {
        Ok((raw.into_report()?, count.max(0) as u32))
      }
      InsertOutcome::Duplicate => Err(warden_core::Error::DuplicateReport {
        media_id,
        reporter_id,
      }),
      InsertOutcome::MediaMissing => {
        Err(warden_core::Error::MediaNotFound(media_id))
      }
    }
  }

  async fn set_report_status(
    &self,
    report_id: Uuid,
    status: ReportStatus,
    audit: NewAuditEntry,
  ) -> Result<ReportEntry, warden_core::Error> {
    let id_str     = encode_uuid(report_id);
    let status_str = encode_report_status(status).to_string();
    let now_str    = encode_dt(Utc::now());

    let outcome: ReviewOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM report_entries WHERE report_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !exists {
          return Ok(ReviewOutcome::NotFound);
        }

        tx.execute(
          "UPDATE report_entries SET status = ?2 WHERE report_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;

        Self::append_audit(&tx, &audit, &now_str)?;

        let raw = tx.query_row(
          &format!(
            "SELECT {REPORT_COLS} FROM report_entries WHERE report_id = ?1"
          ),
          rusqlite::params![id_str],
          report_from_row,
        )?;

        tx.commit()?;
        Ok(ReviewOutcome::Updated(Box::new(raw)))
      })
      .await
      .map_err(Error::from)?;

    match outcome {
      ReviewOutcome::Updated(raw) => Ok(raw.into_report()?),
      ReviewOutcome::NotFound => {
        Err(warden_core::Error::ReportNotFound(report_id))
      }
    }
  }

  async fn list_reports(
    &self,
    media_id: Uuid,
  ) -> Result<Vec<ReportEntry>, warden_core::Error> {
    let id_str = encode_uuid(media_id);

    let raws: Vec<RawReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLS} FROM report_entries
           WHERE media_id = ?1 ORDER BY created_at ASC, report_id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], report_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from)?;

    raws
      .into_iter()
      .map(|r| r.into_report().map_err(Into::into))
      .collect()
  }

  // ── Admin read views ────────────────────────────────────────────────────

  async fn list_queue(
    &self,
    query: QueueQuery,
  ) -> Result<Vec<QueueItem>, warden_core::Error> {
    let status_str = query.status.map(encode_status).map(str::to_string);
    let limit_val  = clamp_i64(query.limit.unwrap_or(50));
    let offset_val = clamp_i64(query.offset.unwrap_or(0));

    let raws: Vec<(RawRecord, RawMedia)> = self
      .conn
      .call(move |conn| {
        let where_clause = if status_str.is_some() {
          "WHERE r.status = ?1"
        } else {
          ""
        };

        let sql = format!(
          "SELECT r.media_id, r.status, r.flags, r.report_count,
                  r.admin_notes, r.last_verdict, r.last_transition_at,
                  r.last_transition_by,
                  m.owner_id, m.title, m.created_at
           FROM moderation_records r
           JOIN media_items m ON m.media_id = r.media_id
           {where_clause}
           ORDER BY r.last_transition_at DESC
           LIMIT ?2 OFFSET ?3"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str.as_deref(), limit_val, offset_val],
            |row| {
              Ok((
                record_from_row(row)?,
                RawMedia {
                  media_id:   row.get(0)?,
                  owner_id:   row.get(8)?,
                  title:      row.get(9)?,
                  created_at: row.get(10)?,
                },
              ))
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from)?;

    raws
      .into_iter()
      .map(|(record, media)| {
        Ok(QueueItem {
          record: record.into_record()?,
          media:  media.into_media()?,
        })
      })
      .collect::<Result<Vec<_>, Error>>()
      .map_err(Into::into)
  }

  async fn list_stale_pending(
    &self,
    older_than: DateTime<Utc>,
  ) -> Result<Vec<QueueItem>, warden_core::Error> {
    let cutoff = encode_dt(older_than);

    let raws: Vec<(RawRecord, RawMedia)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.media_id, r.status, r.flags, r.report_count,
                  r.admin_notes, r.last_verdict, r.last_transition_at,
                  r.last_transition_by,
                  m.owner_id, m.title, m.created_at
           FROM moderation_records r
           JOIN media_items m ON m.media_id = r.media_id
           WHERE r.status = 'pending' AND r.last_transition_at <= ?1
           ORDER BY r.last_transition_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![cutoff], |row| {
            Ok((
              record_from_row(row)?,
              RawMedia {
                media_id:   row.get(0)?,
                owner_id:   row.get(8)?,
                title:      row.get(9)?,
                created_at: row.get(10)?,
              },
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from)?;

    raws
      .into_iter()
      .map(|(record, media)| {
        Ok(QueueItem {
          record: record.into_record()?,
          media:  media.into_media()?,
        })
      })
      .collect::<Result<Vec<_>, Error>>()
      .map_err(Into::into)
  }

  // ── Audit trail ─────────────────────────────────────────────────────────

  async fn record_audit(
    &self,
    entry: NewAuditEntry,
  ) -> Result<AuditEntry, warden_core::Error> {
    let now_str = encode_dt(Utc::now());

    let raw: RawAudit = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = Self::append_audit(&tx, &entry, &now_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await
      .map_err(Error::from)?;

    Ok(raw.into_audit()?)
  }

  async fn list_audit(
    &self,
    query: AuditQuery,
  ) -> Result<Vec<AuditEntry>, warden_core::Error> {
    let subject_str = query.subject_id.map(encode_uuid);
    let actor_str   = query.actor;
    let from_str    = query.from.map(encode_dt);
    let to_str      = query.to.map(encode_dt);
    let limit_val   = clamp_i64(query.limit.unwrap_or(100));
    let offset_val  = clamp_i64(query.offset.unwrap_or(0));

    let raws: Vec<RawAudit> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; placeholder indexes are fixed.
        let mut conds: Vec<&'static str> = vec![];
        if subject_str.is_some() {
          conds.push("subject_id = ?1");
        }
        if actor_str.is_some() {
          conds.push("actor = ?2");
        }
        if from_str.is_some() {
          conds.push("recorded_at >= ?3");
        }
        if to_str.is_some() {
          conds.push("recorded_at <= ?4");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT audit_id, subject_id, action, actor, reason, metadata,
                  ip_address, recorded_at
           FROM audit_entries
           {where_clause}
           ORDER BY recorded_at DESC
           LIMIT ?5 OFFSET ?6"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              subject_str.as_deref(),
              actor_str.as_deref(),
              from_str.as_deref(),
              to_str.as_deref(),
              limit_val,
              offset_val,
            ],
            |row| {
              Ok(RawAudit {
                audit_id:    row.get(0)?,
                subject_id:  row.get(1)?,
                action:      row.get(2)?,
                actor:       row.get(3)?,
                reason:      row.get(4)?,
                metadata:    row.get(5)?,
                ip_address:  row.get(6)?,
                recorded_at: row.get(7)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from)?;

    raws
      .into_iter()
      .map(|r| r.into_audit().map_err(Into::into))
      .collect()
  }
}
