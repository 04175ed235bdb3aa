//! Lifecycle sweep: retire expired and stale records.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use whatson_shared::Result;
use whatson_storage::Catalog;

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepStats {
    /// Records retired because their date has passed.
    pub retired_past: u64,
    /// Records retired because ingestion has not seen them recently.
    pub retired_stale: u64,
}

/// Run both retirement rules.
///
/// Past-dated retirement fires for records dated before `now` unless they
/// are imported. Staleness retirement fires for records last seen more than
/// `staleness_days` before `now`, unless imported or already inactive. Both
/// rules only ever deactivate; nothing is deleted and nothing reactivates.
#[tracing::instrument(skip_all, fields(staleness_days))]
pub async fn sweep(catalog: &Catalog, now: DateTime<Utc>, staleness_days: i64) -> Result<SweepStats> {
    let retired_past = catalog.retire_past_events(now).await?;

    let cutoff = now - Duration::days(staleness_days);
    let retired_stale = catalog.retire_stale_events(cutoff).await?;

    if retired_past > 0 || retired_stale > 0 {
        tracing::info!(retired_past, retired_stale, "sweep retired events");
    }
    Ok(SweepStats {
        retired_past,
        retired_stale,
    })
}
