//! SQL schema for the Almoner SQLite store.
//!
//! Executed once when the pool opens, tracked via `PRAGMA user_version`.
//! Future migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS families (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at   TEXT NOT NULL,   -- YYYY-MM-DDTHH:MM:SS, UTC
    updated_at   TEXT NOT NULL,
    deleted_at   TEXT,            -- NULL while live
    name         TEXT NOT NULL,
    country      TEXT NOT NULL,
    state        TEXT NOT NULL,
    city         TEXT NOT NULL,
    neighborhood TEXT NOT NULL,
    street       TEXT NOT NULL,
    number       TEXT NOT NULL,
    complement   TEXT NOT NULL,
    zipcode      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    family_id  INTEGER NOT NULL REFERENCES families(id),
    name       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,
    name        TEXT NOT NULL,
    amount      REAL NOT NULL,
    measurement TEXT NOT NULL,
    quantity    REAL NOT NULL CHECK (quantity >= 0)
);

-- The donation ledger. Rows are inserted by Donate and deleted by Return;
-- they are never updated.
CREATE TABLE IF NOT EXISTS resources_to_families (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,
    resource_id INTEGER NOT NULL REFERENCES resources(id),
    family_id   INTEGER NOT NULL REFERENCES families(id),
    quantity    REAL NOT NULL CHECK (quantity > 0)
);

CREATE INDEX IF NOT EXISTS persons_family_idx   ON persons(family_id);
CREATE INDEX IF NOT EXISTS donations_resource_idx ON resources_to_families(resource_id);
CREATE INDEX IF NOT EXISTS donations_family_idx   ON resources_to_families(family_id);

PRAGMA user_version = 1;
";

/// Applied to every connection the pool opens; these settings are not
/// persisted in the database file.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA foreign_keys = ON;
";
