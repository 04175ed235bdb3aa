//! libSQL catalog store for the Whatson event pipeline.
//!
//! [`Catalog`] wraps a local libSQL database holding the event catalog,
//! ticket-interest entries, and ingestion run history. The ingestion core
//! uses the identity-key lookup and single-record writes; the bulk
//! conditional updates back the lifecycle sweeper; the listing queries are
//! consumed by the presentation surface (CLI).
//!
//! Every write is a single SQL statement, so each reconciliation decision
//! lands atomically — readers never observe a record mid-update.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Value, params, params_from_iter};
use uuid::Uuid;

use whatson_shared::{EventRecord, EventStatus, Result, TicketRequest, WhatsonError};

/// Columns selected for every full-record read, in `row_to_event` order.
const EVENT_COLUMNS: &str = "id, title, date, time, venue_name, venue_address, city, \
     description, summary, category_json, tags_json, image_url, poster_url, source, \
     original_url, last_scraped_at, status, is_active, imported_at, imported_by, import_notes";

/// Primary storage handle wrapping a libSQL database.
pub struct Catalog {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

// ---------------------------------------------------------------------------
// Listing filter
// ---------------------------------------------------------------------------

/// Query filter for the listing endpoints.
///
/// [`EventFilter::public`] is the end-user view: active, future-dated,
/// city-scoped. [`EventFilter::dashboard`] is the moderation view: city-scoped
/// but including inactive and past records.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub city: Option<String>,
    /// Substring match against title, description, and venue name.
    pub keyword: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
    /// Restrict to `is_active = 1` records.
    pub active_only: bool,
    pub limit: u32,
    pub skip: u32,
}

impl EventFilter {
    /// Public listing: active records dated `now` or later in the given city.
    pub fn public(city: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            city: Some(city.into()),
            keyword: None,
            start_date: Some(now),
            end_date: None,
            status: None,
            active_only: true,
            limit: 50,
            skip: 0,
        }
    }

    /// Moderation dashboard listing: every record in the given city.
    pub fn dashboard(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            keyword: None,
            start_date: None,
            end_date: None,
            status: None,
            active_only: false,
            limit: 100,
            skip: 0,
        }
    }

    /// Build the WHERE clause and bind values shared by list and count.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(city) = &self.city {
            clauses.push("city = ?".into());
            values.push(Value::Text(city.clone()));
        }
        if self.active_only {
            clauses.push("is_active = 1".into());
        }
        if let Some(start) = self.start_date {
            clauses.push("date >= ?".into());
            values.push(Value::Text(start.to_rfc3339()));
        }
        if let Some(end) = self.end_date {
            clauses.push("date <= ?".into());
            values.push(Value::Text(end.to_rfc3339()));
        }
        if let Some(status) = self.status {
            clauses.push("status = ?".into());
            values.push(Value::Text(status.as_str().into()));
        }
        if let Some(keyword) = &self.keyword {
            clauses.push("(title LIKE ? OR description LIKE ? OR venue_name LIKE ?)".into());
            let pattern = format!("%{keyword}%");
            for _ in 0..3 {
                values.push(Value::Text(pattern.clone()));
            }
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

impl Catalog {
    /// Open or create a catalog database at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WhatsonError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        let catalog = Self { db, conn };
        catalog.run_migrations().await?;
        Ok(catalog)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    WhatsonError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Identity-key lookup and single-record writes (reconciler contract)
    // -----------------------------------------------------------------------

    /// Look up a record by its identity key (exact match on `original_url`).
    pub async fn find_by_url(&self, original_url: &str) -> Result<Option<EventRecord>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE original_url = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![original_url])
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_event(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(WhatsonError::Storage(e.to_string())),
        }
    }

    /// Fetch a single record by id.
    pub async fn get_event(&self, id: &str) -> Result<Option<EventRecord>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_event(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(WhatsonError::Storage(e.to_string())),
        }
    }

    /// Insert a fully-populated record. Fails if the identity key exists.
    pub async fn insert_event(&self, event: &EventRecord) -> Result<()> {
        let category_json = serde_json::to_string(&event.category)
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        let tags_json = serde_json::to_string(&event.tags)
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO events (id, title, date, time, venue_name, venue_address, city,
                     description, summary, category_json, tags_json, image_url, poster_url,
                     source, original_url, last_scraped_at, status, is_active,
                     imported_at, imported_by, import_notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19, ?20, ?21)",
                params![
                    event.id.as_str(),
                    event.title.as_str(),
                    event.date.to_rfc3339(),
                    event.time.as_deref(),
                    event.venue_name.as_deref(),
                    event.venue_address.as_deref(),
                    event.city.as_str(),
                    event.description.as_deref(),
                    event.summary.as_deref(),
                    category_json.as_str(),
                    tags_json.as_str(),
                    event.image_url.as_deref(),
                    event.poster_url.as_deref(),
                    event.source.as_str(),
                    event.original_url.as_str(),
                    event.last_scraped_at.to_rfc3339(),
                    event.status.as_str(),
                    i64::from(event.is_active),
                    event.imported_at.map(|t| t.to_rfc3339()),
                    event.imported_by.as_deref(),
                    event.import_notes.as_deref(),
                ],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Replace a record's mutable fields in one atomic statement.
    ///
    /// `id`, `original_url`, and `source` are never rewritten.
    pub async fn update_event(&self, event: &EventRecord) -> Result<()> {
        let category_json = serde_json::to_string(&event.category)
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        let tags_json = serde_json::to_string(&event.tags)
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        let affected = self
            .conn
            .execute(
                "UPDATE events SET
                     title = ?2, date = ?3, time = ?4, venue_name = ?5, venue_address = ?6,
                     city = ?7, description = ?8, summary = ?9, category_json = ?10,
                     tags_json = ?11, image_url = ?12, poster_url = ?13,
                     last_scraped_at = ?14, status = ?15, is_active = ?16,
                     imported_at = ?17, imported_by = ?18, import_notes = ?19
                 WHERE id = ?1",
                params![
                    event.id.as_str(),
                    event.title.as_str(),
                    event.date.to_rfc3339(),
                    event.time.as_deref(),
                    event.venue_name.as_deref(),
                    event.venue_address.as_deref(),
                    event.city.as_str(),
                    event.description.as_deref(),
                    event.summary.as_deref(),
                    category_json.as_str(),
                    tags_json.as_str(),
                    event.image_url.as_deref(),
                    event.poster_url.as_deref(),
                    event.last_scraped_at.to_rfc3339(),
                    event.status.as_str(),
                    i64::from(event.is_active),
                    event.imported_at.map(|t| t.to_rfc3339()),
                    event.imported_by.as_deref(),
                    event.import_notes.as_deref(),
                ],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(WhatsonError::validation(format!(
                "no event with id '{}'",
                event.id
            )));
        }
        Ok(())
    }

    /// Refresh only the last-ingested timestamp (unchanged/imported path).
    pub async fn touch_last_scraped(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE events SET last_scraped_at = ?2 WHERE id = ?1",
                params![id, at.to_rfc3339()],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bulk conditional updates (sweeper contract)
    // -----------------------------------------------------------------------

    /// Retire active, non-imported records dated strictly before `now`.
    /// Returns the number of records transitioned.
    pub async fn retire_past_events(&self, now: DateTime<Utc>) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE events SET status = 'inactive', is_active = 0
                 WHERE date < ?1 AND status != 'imported' AND is_active = 1",
                params![now.to_rfc3339()],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))
    }

    /// Retire active records not seen by ingestion since `cutoff`, unless
    /// already imported or inactive. Returns the number transitioned.
    pub async fn retire_stale_events(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE events SET status = 'inactive', is_active = 0
                 WHERE last_scraped_at < ?1
                   AND status NOT IN ('imported', 'inactive')
                   AND is_active = 1",
                params![cutoff.to_rfc3339()],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Listing queries (presentation surface)
    // -----------------------------------------------------------------------

    /// List records matching `filter`, date-ascending, with limit/skip paging.
    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>> {
        let (where_sql, mut values) = filter.where_clause();
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events{where_sql} ORDER BY date ASC LIMIT ? OFFSET ?"
        );
        values.push(Value::Integer(i64::from(filter.limit)));
        values.push(Value::Integer(i64::from(filter.skip)));

        let mut rows = self
            .conn
            .query(&sql, params_from_iter(values))
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_event(&row)?);
        }
        Ok(results)
    }

    /// Count records matching `filter` (ignoring limit/skip).
    pub async fn count_events(&self, filter: &EventFilter) -> Result<u64> {
        let (where_sql, values) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM events{where_sql}");

        let mut rows = self
            .conn
            .query(&sql, params_from_iter(values))
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| WhatsonError::Storage(e.to_string()))?;
                Ok(count as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(WhatsonError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Ticket-interest entries (append-only)
    // -----------------------------------------------------------------------

    /// Append a ticket-interest entry and return the event's original URL
    /// (the redirect target).
    pub async fn add_ticket_request(
        &self,
        event_id: &str,
        email: &str,
        consent: bool,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let event = self
            .get_event(event_id)
            .await?
            .ok_or_else(|| WhatsonError::validation(format!("no event with id '{event_id}'")))?;

        self.conn
            .execute(
                "INSERT INTO ticket_requests (event_id, email, consent, requested_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![event_id, email, i64::from(consent), at.to_rfc3339()],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        Ok(event.original_url)
    }

    /// List ticket-interest entries for an event, oldest first.
    pub async fn list_ticket_requests(&self, event_id: &str) -> Result<Vec<TicketRequest>> {
        let mut rows = self
            .conn
            .query(
                "SELECT email, consent, requested_at FROM ticket_requests
                 WHERE event_id = ?1 ORDER BY id ASC",
                params![event_id],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let email: String = row
                .get(0)
                .map_err(|e| WhatsonError::Storage(e.to_string()))?;
            let consent: i64 = row
                .get(1)
                .map_err(|e| WhatsonError::Storage(e.to_string()))?;
            let requested_at = parse_timestamp(
                &row.get::<String>(2)
                    .map_err(|e| WhatsonError::Storage(e.to_string()))?,
            )?;
            results.push(TicketRequest {
                email,
                consent: consent != 0,
                requested_at,
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Moderation
    // -----------------------------------------------------------------------

    /// Mark a record as imported by the moderation workflow. This is the only
    /// path to `status = imported`; ingestion treats such records as terminal.
    pub async fn import_event(
        &self,
        id: &str,
        imported_by: &str,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<EventRecord> {
        let affected = self
            .conn
            .execute(
                "UPDATE events SET status = 'imported', imported_at = ?2,
                     imported_by = ?3, import_notes = COALESCE(?4, import_notes)
                 WHERE id = ?1",
                params![id, at.to_rfc3339(), imported_by, notes],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(WhatsonError::validation(format!("no event with id '{id}'")));
        }

        self.get_event(id)
            .await?
            .ok_or_else(|| WhatsonError::Storage(format!("event '{id}' vanished after import")))
    }

    // -----------------------------------------------------------------------
    // Ingestion run bookkeeping
    // -----------------------------------------------------------------------

    /// Record the start of an ingestion run. Returns the generated run ID.
    pub async fn insert_ingest_run(&self, started_at: DateTime<Utc>) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        self.conn
            .execute(
                "INSERT INTO ingest_runs (id, started_at) VALUES (?1, ?2)",
                params![id.as_str(), started_at.to_rfc3339()],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Record run completion with a stats JSON blob.
    pub async fn finish_ingest_run(
        &self,
        run_id: &str,
        stats_json: &str,
        finished_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE ingest_runs SET finished_at = ?2, stats_json = ?3 WHERE id = ?1",
                params![run_id, finished_at.to_rfc3339(), stats_json],
            )
            .await
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

/// Parse an RFC 3339 column into a UTC timestamp.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WhatsonError::Storage(format!("invalid timestamp '{s}': {e}")))
}

/// Convert a database row (in `EVENT_COLUMNS` order) to an [`EventRecord`].
fn row_to_event(row: &libsql::Row) -> Result<EventRecord> {
    let text = |idx: i32| -> Result<String> {
        row.get::<String>(idx)
            .map_err(|e| WhatsonError::Storage(e.to_string()))
    };
    let opt_text = |idx: i32| -> Option<String> { row.get::<String>(idx).ok() };

    let category: Vec<String> = serde_json::from_str(&text(9)?)
        .map_err(|e| WhatsonError::Storage(format!("invalid category_json: {e}")))?;
    let tags: Vec<String> = serde_json::from_str(&text(10)?)
        .map_err(|e| WhatsonError::Storage(format!("invalid tags_json: {e}")))?;
    let status: EventStatus = text(16)?.parse()?;
    let is_active: i64 = row
        .get(17)
        .map_err(|e| WhatsonError::Storage(e.to_string()))?;
    let imported_at = match opt_text(18) {
        Some(s) => Some(parse_timestamp(&s)?),
        None => None,
    };

    Ok(EventRecord {
        id: text(0)?,
        title: text(1)?,
        date: parse_timestamp(&text(2)?)?,
        time: opt_text(3),
        venue_name: opt_text(4),
        venue_address: opt_text(5),
        city: text(6)?,
        description: opt_text(7),
        summary: opt_text(8),
        category,
        tags,
        image_url: opt_text(11),
        poster_url: opt_text(12),
        source: text(13)?,
        original_url: text(14)?,
        last_scraped_at: parse_timestamp(&text(15)?)?,
        status,
        is_active: is_active != 0,
        imported_at,
        imported_by: opt_text(19),
        import_notes: opt_text(20),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Create a temp file catalog for testing.
    async fn test_catalog() -> Catalog {
        let tmp = std::env::temp_dir().join(format!("whatson_test_{}.db", Uuid::now_v7()));
        Catalog::open(&tmp).await.expect("open test db")
    }

    fn sample_event(url: &str, date: DateTime<Utc>) -> EventRecord {
        EventRecord {
            id: Uuid::now_v7().to_string(),
            title: "Sydney Music Festival".into(),
            date,
            time: Some("6:00 PM".into()),
            venue_name: Some("Sydney Opera House".into()),
            venue_address: Some("Bennelong Point, Sydney NSW 2000".into()),
            city: "Sydney".into(),
            description: Some("A spectacular music festival.".into()),
            summary: Some("Music festival".into()),
            category: vec!["Music".into(), "Festival".into()],
            tags: vec![],
            image_url: Some("https://example.com/poster.jpg".into()),
            poster_url: None,
            source: "Eventbrite".into(),
            original_url: url.into(),
            last_scraped_at: Utc::now(),
            status: EventStatus::New,
            is_active: true,
            imported_at: None,
            imported_by: None,
            import_notes: None,
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let catalog = test_catalog().await;
        assert_eq!(catalog.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn insert_and_find_by_url() {
        let catalog = test_catalog().await;
        let event = sample_event("https://example.com/e/1", Utc::now() + Duration::days(5));
        catalog.insert_event(&event).await.expect("insert");

        let found = catalog
            .find_by_url("https://example.com/e/1")
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.id, event.id);
        assert_eq!(found.title, "Sydney Music Festival");
        assert_eq!(found.category, vec!["Music", "Festival"]);
        assert_eq!(found.status, EventStatus::New);
        assert!(found.is_active);

        let missing = catalog
            .find_by_url("https://example.com/e/none")
            .await
            .expect("find");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn identity_key_is_unique() {
        let catalog = test_catalog().await;
        let date = Utc::now() + Duration::days(2);
        catalog
            .insert_event(&sample_event("https://example.com/e/dup", date))
            .await
            .expect("first insert");

        let result = catalog
            .insert_event(&sample_event("https://example.com/e/dup", date))
            .await;
        assert!(result.is_err(), "duplicate identity key must be rejected");
    }

    #[tokio::test]
    async fn update_event_replaces_fields() {
        let catalog = test_catalog().await;
        let mut event = sample_event("https://example.com/e/2", Utc::now() + Duration::days(3));
        catalog.insert_event(&event).await.unwrap();

        event.title = "Renamed Festival".into();
        event.venue_name = Some("Hyde Park".into());
        event.status = EventStatus::Updated;
        catalog.update_event(&event).await.expect("update");

        let found = catalog.get_event(&event.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Renamed Festival");
        assert_eq!(found.venue_name.as_deref(), Some("Hyde Park"));
        assert_eq!(found.status, EventStatus::Updated);
    }

    #[tokio::test]
    async fn touch_only_moves_timestamp() {
        let catalog = test_catalog().await;
        let event = sample_event("https://example.com/e/3", Utc::now() + Duration::days(3));
        catalog.insert_event(&event).await.unwrap();

        let later = Utc::now() + Duration::hours(6);
        catalog.touch_last_scraped(&event.id, later).await.unwrap();

        let found = catalog.get_event(&event.id).await.unwrap().unwrap();
        assert_eq!(found.last_scraped_at, later);
        assert_eq!(found.title, event.title);
        assert_eq!(found.status, EventStatus::New);
    }

    #[tokio::test]
    async fn retire_past_skips_imported() {
        let catalog = test_catalog().await;
        let now = Utc::now();

        let past = sample_event("https://example.com/e/past", now - Duration::days(1));
        catalog.insert_event(&past).await.unwrap();

        let mut imported = sample_event("https://example.com/e/imported", now - Duration::days(1));
        imported.status = EventStatus::Imported;
        catalog.insert_event(&imported).await.unwrap();

        let future = sample_event("https://example.com/e/future", now + Duration::days(1));
        catalog.insert_event(&future).await.unwrap();

        let retired = catalog.retire_past_events(now).await.expect("retire");
        assert_eq!(retired, 1);

        let past = catalog.get_event(&past.id).await.unwrap().unwrap();
        assert_eq!(past.status, EventStatus::Inactive);
        assert!(!past.is_active);

        // Imported record keeps its status and stays active
        let imported = catalog.get_event(&imported.id).await.unwrap().unwrap();
        assert_eq!(imported.status, EventStatus::Imported);
        assert!(imported.is_active);

        let future = catalog.get_event(&future.id).await.unwrap().unwrap();
        assert!(future.is_active);

        // Idempotent: a second sweep touches nothing
        let retired_again = catalog.retire_past_events(now).await.unwrap();
        assert_eq!(retired_again, 0);
    }

    #[tokio::test]
    async fn retire_stale_fires_independently_of_date() {
        let catalog = test_catalog().await;
        let now = Utc::now();

        // Future-dated but last seen 40 days ago
        let mut stale = sample_event("https://example.com/e/stale", now + Duration::days(10));
        stale.last_scraped_at = now - Duration::days(40);
        catalog.insert_event(&stale).await.unwrap();

        let fresh = sample_event("https://example.com/e/fresh", now + Duration::days(10));
        catalog.insert_event(&fresh).await.unwrap();

        let cutoff = now - Duration::days(30);
        let retired = catalog.retire_stale_events(cutoff).await.expect("retire");
        assert_eq!(retired, 1);

        let stale = catalog.get_event(&stale.id).await.unwrap().unwrap();
        assert_eq!(stale.status, EventStatus::Inactive);
        assert!(!stale.is_active);

        let fresh = catalog.get_event(&fresh.id).await.unwrap().unwrap();
        assert!(fresh.is_active);
    }

    #[tokio::test]
    async fn public_listing_excludes_inactive_and_past() {
        let catalog = test_catalog().await;
        let now = Utc::now();

        let upcoming = sample_event("https://example.com/e/up", now + Duration::days(2));
        catalog.insert_event(&upcoming).await.unwrap();

        let past = sample_event("https://example.com/e/gone", now - Duration::days(2));
        catalog.insert_event(&past).await.unwrap();

        let mut retired = sample_event("https://example.com/e/retired", now + Duration::days(2));
        retired.status = EventStatus::Inactive;
        retired.is_active = false;
        catalog.insert_event(&retired).await.unwrap();

        let filter = EventFilter::public("Sydney", now);
        let listed = catalog.list_events(&filter).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, upcoming.id);
        assert_eq!(catalog.count_events(&filter).await.unwrap(), 1);

        // The dashboard still sees all three
        let dash = EventFilter::dashboard("Sydney");
        assert_eq!(catalog.count_events(&dash).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn keyword_filter_matches_title_description_venue() {
        let catalog = test_catalog().await;
        let now = Utc::now();

        let mut jazz = sample_event("https://example.com/e/jazz", now + Duration::days(1));
        jazz.title = "Harbour Jazz Night".into();
        jazz.description = Some("Smooth sets by the water.".into());
        catalog.insert_event(&jazz).await.unwrap();

        let mut expo = sample_event("https://example.com/e/expo", now + Duration::days(1));
        expo.title = "Food Expo".into();
        expo.venue_name = Some("Jazz Corner Hall".into());
        expo.description = Some("Tastings all day.".into());
        catalog.insert_event(&expo).await.unwrap();

        let mut run = sample_event("https://example.com/e/run", now + Duration::days(1));
        run.title = "City Marathon".into();
        run.venue_name = Some("Harbour Bridge".into());
        run.description = Some("Annual race.".into());
        catalog.insert_event(&run).await.unwrap();

        let mut filter = EventFilter::public("Sydney", now);
        filter.keyword = Some("Jazz".into());
        let listed = catalog.list_events(&filter).await.expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|e| e.id != run.id));
    }

    #[tokio::test]
    async fn ticket_requests_append_only() {
        let catalog = test_catalog().await;
        let event = sample_event("https://example.com/e/tix", Utc::now() + Duration::days(4));
        catalog.insert_event(&event).await.unwrap();

        let redirect = catalog
            .add_ticket_request(&event.id, "alex@example.com", true, Utc::now())
            .await
            .expect("add request");
        assert_eq!(redirect, event.original_url);

        // Same email again is appended, not deduplicated
        catalog
            .add_ticket_request(&event.id, "alex@example.com", true, Utc::now())
            .await
            .expect("add again");

        let requests = catalog.list_ticket_requests(&event.id).await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].consent);

        let missing = catalog
            .add_ticket_request("no-such-id", "alex@example.com", true, Utc::now())
            .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn import_sets_status_and_metadata() {
        let catalog = test_catalog().await;
        let event = sample_event("https://example.com/e/mod", Utc::now() + Duration::days(4));
        catalog.insert_event(&event).await.unwrap();

        let at = Utc::now();
        let imported = catalog
            .import_event(&event.id, "moderator-1", Some("looks legit"), at)
            .await
            .expect("import");

        assert_eq!(imported.status, EventStatus::Imported);
        assert_eq!(imported.imported_by.as_deref(), Some("moderator-1"));
        assert_eq!(imported.import_notes.as_deref(), Some("looks legit"));
        assert!(imported.imported_at.is_some());
    }

    #[tokio::test]
    async fn ingest_run_lifecycle() {
        let catalog = test_catalog().await;
        let run_id = catalog
            .insert_ingest_run(Utc::now())
            .await
            .expect("insert run");
        assert!(!run_id.is_empty());

        catalog
            .finish_ingest_run(&run_id, r#"{"inserted": 3}"#, Utc::now())
            .await
            .expect("finish run");
    }
}
