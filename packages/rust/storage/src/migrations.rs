//! SQL migration definitions for the Whatson catalog database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: events, ticket_requests, ingest_runs",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- The event catalog. original_url is the identity key: unique across the
-- catalog and the sole correlation key between ingestion runs.
CREATE TABLE IF NOT EXISTS events (
    id              TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    date            TEXT NOT NULL,
    time            TEXT,
    venue_name      TEXT,
    venue_address   TEXT,
    city            TEXT NOT NULL,
    description     TEXT,
    summary         TEXT,
    category_json   TEXT NOT NULL DEFAULT '[]',
    tags_json       TEXT NOT NULL DEFAULT '[]',
    image_url       TEXT,
    poster_url      TEXT,
    source          TEXT NOT NULL,
    original_url    TEXT NOT NULL UNIQUE,
    last_scraped_at TEXT NOT NULL,
    status          TEXT NOT NULL,
    is_active       INTEGER NOT NULL,
    imported_at     TEXT,
    imported_by     TEXT,
    import_notes    TEXT
);

CREATE INDEX IF NOT EXISTS idx_events_city_active_date ON events(city, is_active, date);
CREATE INDEX IF NOT EXISTS idx_events_status ON events(status);
CREATE INDEX IF NOT EXISTS idx_events_last_scraped ON events(last_scraped_at);

-- Ticket-interest entries. Append-only; never touched by ingestion.
CREATE TABLE IF NOT EXISTS ticket_requests (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id     TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    email        TEXT NOT NULL,
    consent      INTEGER NOT NULL,
    requested_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ticket_requests_event ON ticket_requests(event_id);

-- Ingestion run history
CREATE TABLE IF NOT EXISTS ingest_runs (
    id          TEXT PRIMARY KEY,
    started_at  TEXT NOT NULL,
    finished_at TEXT,
    stats_json  TEXT
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
