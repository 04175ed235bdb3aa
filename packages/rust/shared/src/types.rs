//! Core domain types for the Whatson event catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WhatsonError;

// ---------------------------------------------------------------------------
// EventStatus
// ---------------------------------------------------------------------------

/// Workflow state of a catalog record.
///
/// `New` and `Updated` are set by the reconciler, `Inactive` by the lifecycle
/// sweeper, and `Imported` only by the moderation import action. Once a record
/// is `Imported`, ingestion never overwrites its descriptive fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    New,
    Updated,
    Inactive,
    Imported,
}

impl EventStatus {
    /// Stable string form used in the database and CLI filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Inactive => "inactive",
            Self::Imported => "imported",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = WhatsonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "updated" => Ok(Self::Updated),
            "inactive" => Ok(Self::Inactive),
            "imported" => Ok(Self::Imported),
            other => Err(WhatsonError::validation(format!(
                "unknown event status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// The canonical catalog entity, fully populated at every write site.
///
/// `original_url` is the identity key: the source-qualified canonical URL
/// that uniquely identifies one real-world event across repeated ingestion
/// runs. It is unique in the catalog and immutable once assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique record identifier (UUID v7, time-sortable).
    pub id: String,
    /// Event title.
    pub title: String,
    /// Event start date.
    pub date: DateTime<Utc>,
    /// Free-form display time (e.g. "6:00 PM", "TBA").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_address: Option<String>,
    /// City, defaulted by the normalizer when the source omits it.
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short summary, derived from the description when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Ordered category tags.
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Name of the source the record was ingested from.
    pub source: String,
    /// Identity key — source-qualified canonical URL.
    pub original_url: String,
    /// When ingestion last saw this record.
    pub last_scraped_at: DateTime<Utc>,
    /// Workflow status.
    pub status: EventStatus,
    /// Inactive records are hidden from public listings, never deleted.
    pub is_active: bool,
    /// Set only by the moderation import action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_notes: Option<String>,
}

// ---------------------------------------------------------------------------
// TicketRequest
// ---------------------------------------------------------------------------

/// A ticket-interest entry attached to an event. Append-only; ingestion never
/// touches these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    pub email: String,
    pub consent: bool,
    pub requested_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RawEvent
// ---------------------------------------------------------------------------

/// A loosely-structured record as produced by a source adapter, before
/// normalization. Everything is optional; the normalizer rejects records
/// missing a title, date, or canonical URL.
#[derive(Debug, Clone, Default)]
pub struct RawEvent {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub time: Option<String>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub category: Vec<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub poster_url: Option<String>,
    /// Source-qualified canonical URL — becomes the identity key.
    pub original_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A normalized, not-yet-reconciled event produced for one ingestion cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub date: DateTime<Utc>,
    pub time: Option<String>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub city: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub category: Vec<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub poster_url: Option<String>,
    pub source: String,
    /// Identity key.
    pub original_url: String,
}
