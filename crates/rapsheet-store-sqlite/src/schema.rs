//! SQL schema for the rapsheet SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS records (
    id          TEXT PRIMARY KEY,            -- user-supplied person number
    first_name  TEXT NOT NULL CHECK (first_name != ''),
    last_name   TEXT NOT NULL CHECK (last_name  != ''),
    dob         TEXT NOT NULL DEFAULT '',
    address     TEXT NOT NULL DEFAULT '',
    status      TEXT NOT NULL
                CHECK (status IN ('Incarcerated', 'On Parole', 'Released', 'Wanted')),
    photo_url   TEXT NOT NULL DEFAULT '',
    last_seen   TEXT NOT NULL DEFAULT '',
    physical    TEXT NOT NULL DEFAULT '{}',  -- JSON PhysicalDescription
    offenses    TEXT NOT NULL DEFAULT '[]',  -- JSON array, most recent first
    created_at  TEXT NOT NULL,               -- fixed-width RFC 3339 UTC
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_created_idx ON records(created_at);
CREATE INDEX IF NOT EXISTS records_status_idx  ON records(status);

PRAGMA user_version = 1;
";

/// Column list shared by every `SELECT` that decodes into a `RawRecord`.
pub const RECORD_COLUMNS: &str = "id, first_name, last_name, dob, address, \
   status, photo_url, last_seen, physical, offenses, created_at, updated_at";
