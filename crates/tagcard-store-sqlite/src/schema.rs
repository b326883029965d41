//! SQL schema for the tagcard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL COLLATE NOCASE UNIQUE,
    password_hash TEXT NOT NULL,        -- argon2 PHC string
    first_name    TEXT,
    last_name     TEXT,
    role          TEXT NOT NULL DEFAULT 'standard',  -- 'standard' | 'administrator'
    created_at    TEXT NOT NULL
);

-- account_id is NULL while the tag is unclaimed. UNIQUE allows any number of
-- NULLs, so it only constrains bound tags: one tag per account.
CREATE TABLE IF NOT EXISTS tag_records (
    tag_id      TEXT PRIMARY KEY,
    account_id  TEXT UNIQUE REFERENCES accounts(account_id),
    created_at  TEXT NOT NULL,
    bound_at    TEXT
);

-- Bind-once: a bound tag's owner never changes.
CREATE TRIGGER IF NOT EXISTS tag_records_bind_once
BEFORE UPDATE OF account_id ON tag_records
WHEN OLD.account_id IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'tag is already bound');
END;

CREATE TABLE IF NOT EXISTS contact_profiles (
    account_id  TEXT PRIMARY KEY REFERENCES accounts(account_id),
    phone       TEXT,
    address     TEXT,
    description TEXT,
    photo_url   TEXT,
    linkedin    TEXT,
    whatsapp    TEXT,
    telegram    TEXT,
    facebook    TEXT,
    instagram   TEXT,
    twitter     TEXT,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tag_records_created_idx ON tag_records(created_at);

PRAGMA user_version = 1;
";
