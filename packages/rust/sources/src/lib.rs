//! Source adapters for the Whatson ingestion pipeline.
//!
//! Each adapter fetches one upstream listing (Eventbrite, Facebook Events,
//! Eventfinda) and parses it into loosely-structured [`RawEvent`]s. Adapters
//! never touch storage and never decide record lifecycle; they only report
//! what the source currently lists. A failed adapter returns an error for its
//! source alone, the orchestrator keeps the others running.
//!
//! [`FixtureAdapter`] is a deterministic stand-in for live sources, used in
//! tests and demo runs.

mod date;
mod eventbrite;
mod eventfinda;
mod facebook;
mod fixture;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use whatson_shared::{RawEvent, Result, SourcesConfig, WhatsonError};

pub use date::{clean_text, extract_time, parse_event_date};
pub use eventbrite::EventbriteAdapter;
pub use eventfinda::EventfindaAdapter;
pub use facebook::FacebookAdapter;
pub use fixture::FixtureAdapter;

const USER_AGENT: &str = concat!("whatson/", env!("CARGO_PKG_VERSION"));

/// Boxed future type keeping [`SourceAdapter`] object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One upstream event listing.
///
/// Implementations must be cheap to share (`Arc`) so the orchestrator can
/// fan out one task per adapter.
pub trait SourceAdapter: Send + Sync {
    /// Source name recorded on every event this adapter produces.
    fn name(&self) -> &str;

    /// Fetch the listing and parse it into raw events.
    ///
    /// Parse failures on individual items are logged and skipped; only a
    /// failure to obtain the listing itself is an error.
    fn fetch<'a>(&'a self, client: &'a Client) -> BoxFuture<'a, Result<Vec<RawEvent>>>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds the adapters enabled for a run.
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    /// Build the registry from config. With `use_fixture` set, a single
    /// deterministic fixture adapter replaces all live sources.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        if config.use_fixture {
            return Ok(Self {
                adapters: vec![Arc::new(FixtureAdapter::new())],
            });
        }

        let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
        for name in &config.enabled {
            match name.as_str() {
                "eventbrite" => adapters.push(Arc::new(EventbriteAdapter::new(
                    config.eventbrite_url.clone(),
                ))),
                "facebook" => {
                    adapters.push(Arc::new(FacebookAdapter::new(config.facebook_url.clone())))
                }
                "eventfinda" => adapters.push(Arc::new(EventfindaAdapter::new(
                    config.eventfinda_url.clone(),
                ))),
                other => {
                    return Err(WhatsonError::config(format!(
                        "unknown source adapter '{other}'"
                    )));
                }
            }
        }
        Ok(Self { adapters })
    }

    /// Build a registry from explicit adapters.
    pub fn with_adapters(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Enabled adapters, in config order.
    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Build the shared HTTP client used by all adapters in a run.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| WhatsonError::Network(e.to_string()))
}
