//! Run orchestrator: fan out over adapters, reconcile, sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinSet;

use whatson_shared::{IngestOptions, RawEvent, Result, WhatsonError};
use whatson_sources::{SourceRegistry, build_client};
use whatson_storage::Catalog;

use crate::reconcile::{ReconcileOutcome, reconcile};
use crate::sweep::{SweepStats, sweep};
use crate::normalize::normalize;

/// Per-source fetch result for one run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    /// Raw events the adapter returned (0 when it failed).
    pub fetched: usize,
    /// Fetch error, if the source failed. Other sources are unaffected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one complete ingestion cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceOutcome>,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Raw events rejected by normalization.
    pub skipped: u64,
    /// Candidates whose reconciliation failed.
    pub failed: u64,
    pub sweep: SweepStats,
}

/// Drives complete ingestion cycles. One instance allows one run at a time;
/// a second concurrent call fails fast with [`WhatsonError::RunInProgress`].
pub struct Ingestor {
    catalog: Arc<Catalog>,
    registry: SourceRegistry,
    client: Client,
    options: IngestOptions,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the run ends, on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Ingestor {
    pub fn new(
        catalog: Arc<Catalog>,
        registry: SourceRegistry,
        options: IngestOptions,
    ) -> Result<Self> {
        Ok(Self {
            catalog,
            registry,
            client: build_client()?,
            options,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Execute one full cycle: fetch all sources concurrently, reconcile the
    /// combined results sequentially, then sweep.
    #[tracing::instrument(skip_all, fields(sources = self.registry.adapters().len()))]
    pub async fn run(&self) -> Result<RunReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WhatsonError::RunInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let started_at = Utc::now();
        let run_id = self.catalog.insert_ingest_run(started_at).await?;
        tracing::info!(%run_id, sources = self.registry.adapters().len(), "ingestion run started");

        let fetched = self.fetch_all().await;

        let mut report = RunReport {
            run_id: run_id.clone(),
            started_at,
            finished_at: started_at,
            sources: Vec::new(),
            inserted: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
            sweep: SweepStats::default(),
        };

        for (source, result) in fetched {
            match result {
                Ok(raw_events) => {
                    report.sources.push(SourceOutcome {
                        source: source.clone(),
                        fetched: raw_events.len(),
                        error: None,
                    });
                    self.reconcile_batch(&source, raw_events, &mut report).await;
                }
                Err(e) => {
                    tracing::error!(%source, error = %e, "source fetch failed");
                    report.sources.push(SourceOutcome {
                        source,
                        fetched: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        report.sweep = sweep(&self.catalog, Utc::now(), self.options.staleness_days).await?;
        report.finished_at = Utc::now();

        let stats_json = serde_json::to_string(&report)
            .map_err(|e| WhatsonError::Storage(e.to_string()))?;
        self.catalog
            .finish_ingest_run(&run_id, &stats_json, report.finished_at)
            .await?;

        tracing::info!(
            %run_id,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "ingestion run finished"
        );
        Ok(report)
    }

    /// Fetch every enabled source on its own task. A panicking or failing
    /// adapter surfaces as an error entry for that source only.
    async fn fetch_all(&self) -> Vec<(String, Result<Vec<RawEvent>>)> {
        let mut tasks = JoinSet::new();
        for adapter in self.registry.adapters() {
            let adapter = Arc::clone(adapter);
            let client = self.client.clone();
            tasks.spawn(async move {
                let name = adapter.name().to_string();
                let result = adapter.fetch(&client).await;
                (name, result)
            });
        }

        let mut fetched = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => fetched.push(entry),
                Err(e) => fetched.push((
                    "unknown".into(),
                    Err(WhatsonError::Network(format!("adapter task failed: {e}"))),
                )),
            }
        }
        // Task completion order is nondeterministic
        fetched.sort_by(|a, b| a.0.cmp(&b.0));
        fetched
    }

    /// Normalize and reconcile one source's raw events. A failed candidate
    /// is logged with its identity key and does not stop the batch.
    async fn reconcile_batch(
        &self,
        source: &str,
        raw_events: Vec<RawEvent>,
        report: &mut RunReport,
    ) {
        for raw in raw_events {
            let Some(candidate) = normalize(raw, source, &self.options) else {
                report.skipped += 1;
                continue;
            };

            match reconcile(&self.catalog, &candidate, Utc::now()).await {
                Ok(ReconcileOutcome::Inserted) => report.inserted += 1,
                Ok(ReconcileOutcome::Updated) => report.updated += 1,
                Ok(ReconcileOutcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        url = %candidate.original_url,
                        error = %e,
                        "failed to reconcile candidate"
                    );
                }
            }
        }
    }
}
