//! SQL schema for the Warden SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS media_items (
    media_id   TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL,
    title      TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- One moderation record per media item. `status` is written only through
-- commit_transition (CAS on the previous status + audit row, one txn).
CREATE TABLE IF NOT EXISTS moderation_records (
    media_id           TEXT PRIMARY KEY REFERENCES media_items(media_id),
    status             TEXT NOT NULL DEFAULT 'pending',
    flags              TEXT NOT NULL DEFAULT '[]',  -- JSON array, accumulated
    report_count       INTEGER NOT NULL DEFAULT 0,
    admin_notes        TEXT,
    last_verdict       TEXT,            -- 'clean' | 'flagged' | 'rejected'
    last_transition_at TEXT NOT NULL,
    last_transition_by TEXT NOT NULL    -- encoded Actor
);

-- One report per (media, reporter); the UNIQUE constraint is the dedupe.
CREATE TABLE IF NOT EXISTS report_entries (
    report_id   TEXT PRIMARY KEY,
    media_id    TEXT NOT NULL REFERENCES media_items(media_id),
    reporter_id TEXT NOT NULL,
    reason      TEXT NOT NULL,
    description TEXT,
    status      TEXT NOT NULL DEFAULT 'pending',
    created_at  TEXT NOT NULL,
    UNIQUE (media_id, reporter_id)
);

-- Audit entries are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_entries (
    audit_id    TEXT PRIMARY KEY,
    subject_id  TEXT NOT NULL,
    action      TEXT NOT NULL,
    actor       TEXT NOT NULL,           -- encoded Actor
    reason      TEXT,
    metadata    TEXT NOT NULL DEFAULT '{}',
    ip_address  TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_status_idx     ON moderation_records(status);
CREATE INDEX IF NOT EXISTS records_transition_idx ON moderation_records(last_transition_at);
CREATE INDEX IF NOT EXISTS reports_media_idx      ON report_entries(media_id);
CREATE INDEX IF NOT EXISTS audit_subject_idx      ON audit_entries(subject_id);
CREATE INDEX IF NOT EXISTS audit_actor_idx        ON audit_entries(actor);
CREATE INDEX IF NOT EXISTS audit_recorded_idx     ON audit_entries(recorded_at);

PRAGMA user_version = 1;
";
