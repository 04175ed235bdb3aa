//! Candidate reconciliation against the catalog.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use whatson_shared::{Candidate, EventRecord, EventStatus, Result};
use whatson_storage::Catalog;

/// What the reconciler did with one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record carried the identity key; a new one was inserted.
    Inserted,
    /// Descriptive fields differed; the record was overwritten.
    Updated,
    /// Nothing differed (or the record is imported); only the
    /// last-ingested timestamp moved.
    Unchanged,
}

/// Reconcile one candidate by its identity key.
///
/// Imported records are terminal for ingestion: whatever the source now
/// says, only their last-ingested timestamp is refreshed. Every outcome is
/// idempotent; feeding the same candidate twice yields `Unchanged` the
/// second time.
pub async fn reconcile(
    catalog: &Catalog,
    candidate: &Candidate,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome> {
    let Some(existing) = catalog.find_by_url(&candidate.original_url).await? else {
        catalog.insert_event(&new_record(candidate, now)).await?;
        tracing::info!(title = %candidate.title, url = %candidate.original_url, "added new event");
        return Ok(ReconcileOutcome::Inserted);
    };

    if existing.status == EventStatus::Imported || !descriptive_change(&existing, candidate) {
        catalog.touch_last_scraped(&existing.id, now).await?;
        return Ok(ReconcileOutcome::Unchanged);
    }

    catalog
        .update_event(&updated_record(&existing, candidate, now))
        .await?;
    tracing::info!(title = %candidate.title, url = %candidate.original_url, "updated event");
    Ok(ReconcileOutcome::Updated)
}

/// The change test covers exactly title, date, venue name, and description.
/// Differences in any other field alone do not count as a change.
fn descriptive_change(existing: &EventRecord, candidate: &Candidate) -> bool {
    existing.title != candidate.title
        || existing.date != candidate.date
        || existing.venue_name != candidate.venue_name
        || existing.description != candidate.description
}

/// Full record for a first-seen candidate.
fn new_record(candidate: &Candidate, now: DateTime<Utc>) -> EventRecord {
    EventRecord {
        id: Uuid::now_v7().to_string(),
        title: candidate.title.clone(),
        date: candidate.date,
        time: candidate.time.clone(),
        venue_name: candidate.venue_name.clone(),
        venue_address: candidate.venue_address.clone(),
        city: candidate.city.clone(),
        description: candidate.description.clone(),
        summary: candidate.summary.clone(),
        category: candidate.category.clone(),
        tags: candidate.tags.clone(),
        image_url: candidate.image_url.clone(),
        poster_url: candidate.poster_url.clone(),
        source: candidate.source.clone(),
        original_url: candidate.original_url.clone(),
        last_scraped_at: now,
        status: EventStatus::New,
        is_active: true,
        imported_at: None,
        imported_by: None,
        import_notes: None,
    }
}

/// Existing record with the candidate's descriptive fields applied.
///
/// Identity, city, activity flag, and moderation metadata are preserved; a
/// retired record that reappears changed gets `status = updated` but stays
/// hidden until someone reactivates it.
fn updated_record(existing: &EventRecord, candidate: &Candidate, now: DateTime<Utc>) -> EventRecord {
    EventRecord {
        id: existing.id.clone(),
        title: candidate.title.clone(),
        date: candidate.date,
        time: candidate.time.clone(),
        venue_name: candidate.venue_name.clone(),
        venue_address: candidate.venue_address.clone(),
        city: existing.city.clone(),
        description: candidate.description.clone(),
        summary: candidate.summary.clone(),
        category: candidate.category.clone(),
        tags: existing.tags.clone(),
        image_url: candidate.image_url.clone(),
        poster_url: existing.poster_url.clone(),
        source: existing.source.clone(),
        original_url: existing.original_url.clone(),
        last_scraped_at: now,
        status: EventStatus::Updated,
        is_active: existing.is_active,
        imported_at: existing.imported_at,
        imported_by: existing.imported_by.clone(),
        import_notes: existing.import_notes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_catalog() -> Catalog {
        let tmp = std::env::temp_dir().join(format!("whatson_reconcile_{}.db", Uuid::now_v7()));
        Catalog::open(&tmp).await.expect("open test db")
    }

    fn candidate(url: &str, date: DateTime<Utc>) -> Candidate {
        Candidate {
            title: "Harbour Jazz Night".into(),
            date,
            time: Some("7:30 PM".into()),
            venue_name: Some("The Basement".into()),
            venue_address: None,
            city: "Sydney".into(),
            description: Some("An evening of live jazz.".into()),
            summary: Some("Live jazz".into()),
            category: vec!["Music".into()],
            tags: vec![],
            image_url: None,
            poster_url: None,
            source: "Eventfinda".into(),
            original_url: url.into(),
        }
    }

    #[tokio::test]
    async fn first_sighting_inserts() {
        let catalog = test_catalog().await;
        let now = Utc::now();
        let cand = candidate("https://x/e/1", now + Duration::days(5));

        let outcome = reconcile(&catalog, &cand, now).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Inserted);

        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::New);
        assert!(stored.is_active);
        assert_eq!(stored.last_scraped_at, now);
    }

    #[tokio::test]
    async fn identical_candidate_is_idempotent() {
        let catalog = test_catalog().await;
        let now = Utc::now();
        let cand = candidate("https://x/e/1", now + Duration::days(5));

        reconcile(&catalog, &cand, now).await.unwrap();
        let later = now + Duration::hours(6);
        let outcome = reconcile(&catalog, &cand, later).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);

        // Status stays new; only the timestamp moved
        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::New);
        assert_eq!(stored.last_scraped_at, later);
    }

    #[tokio::test]
    async fn descriptive_change_updates() {
        let catalog = test_catalog().await;
        let now = Utc::now();
        let date = now + Duration::days(5);
        reconcile(&catalog, &candidate("https://x/e/1", date), now)
            .await
            .unwrap();

        let mut changed = candidate("https://x/e/1", date);
        changed.venue_name = Some("Hyde Park".into());
        let outcome = reconcile(&catalog, &changed, now).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Updated);

        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Updated);
        assert_eq!(stored.venue_name.as_deref(), Some("Hyde Park"));

        // Applying the same change again settles to unchanged
        let outcome = reconcile(&catalog, &changed, now).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
    }

    #[tokio::test]
    async fn cosmetic_change_does_not_update() {
        let catalog = test_catalog().await;
        let now = Utc::now();
        let date = now + Duration::days(5);
        reconcile(&catalog, &candidate("https://x/e/1", date), now)
            .await
            .unwrap();

        // image_url is outside the change-detection set
        let mut cosmetic = candidate("https://x/e/1", date);
        cosmetic.image_url = Some("https://cdn/x.jpg".into());
        let outcome = reconcile(&catalog, &cosmetic, now).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);

        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        assert!(stored.image_url.is_none());
    }

    #[tokio::test]
    async fn imported_records_only_get_touched() {
        let catalog = test_catalog().await;
        let now = Utc::now();
        let date = now + Duration::days(5);
        reconcile(&catalog, &candidate("https://x/e/1", date), now)
            .await
            .unwrap();

        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        catalog
            .import_event(&stored.id, "moderator-1", None, now)
            .await
            .unwrap();

        let mut changed = candidate("https://x/e/1", date);
        changed.title = "Completely Different".into();
        let later = now + Duration::hours(6);
        let outcome = reconcile(&catalog, &changed, later).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);

        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Imported);
        assert_eq!(stored.title, "Harbour Jazz Night");
        assert_eq!(stored.last_scraped_at, later);
    }

    #[tokio::test]
    async fn retired_record_stays_hidden_after_update() {
        let catalog = test_catalog().await;
        let now = Utc::now();
        let past = now - Duration::days(2);
        reconcile(&catalog, &candidate("https://x/e/1", past), now)
            .await
            .unwrap();
        catalog.retire_past_events(now).await.unwrap();

        let mut changed = candidate("https://x/e/1", now + Duration::days(9));
        changed.title = "Rescheduled Jazz Night".into();
        let outcome = reconcile(&catalog, &changed, now).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Updated);

        let stored = catalog.find_by_url("https://x/e/1").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Updated);
        assert!(!stored.is_active, "reactivation is a moderation decision");
    }
}
