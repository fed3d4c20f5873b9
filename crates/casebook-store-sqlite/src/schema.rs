//! SQL schema for the Casebook SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Name of the index that serves the newest-first case-history query.
/// [`crate::SqliteStore`] refuses to run the ordered query without it.
pub const UPDATES_INDEX: &str = "case_updates_case_ts_idx";

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,   -- provider-issued, immutable
    email        TEXT NOT NULL,
    display_name TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL,      -- ISO 8601 UTC; server-assigned
    role         TEXT,               -- NULL until assigned
    last_login   TEXT
);

-- Field defaults are applied at creation time, so every column a reader
-- touches is NOT NULL.
CREATE TABLE IF NOT EXISTS cases (
    case_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    priority    TEXT NOT NULL,
    status      TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Case updates are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS case_updates (
    update_id  TEXT PRIMARY KEY,
    case_id    TEXT NOT NULL REFERENCES cases(case_id),
    user_email TEXT NOT NULL,
    text       TEXT NOT NULL,
    new_status TEXT,
    timestamp  TEXT NOT NULL       -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS cases_owner_idx ON cases(user_id);
CREATE INDEX IF NOT EXISTS case_updates_case_ts_idx
    ON case_updates(case_id, timestamp);

PRAGMA user_version = 1;
";
