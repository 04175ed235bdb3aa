//! Shared types, error model, and configuration for Whatson.
//!
//! This crate is the foundation depended on by all other Whatson crates.
//! It provides:
//! - [`WhatsonError`] — the unified error type
//! - Domain types ([`EventRecord`], [`Candidate`], [`RawEvent`], [`EventStatus`])
//! - Configuration ([`AppConfig`], [`IngestOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, IngestOptions, SchedulerConfig, SourcesConfig, SweepConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, WhatsonError};
pub use types::{Candidate, EventRecord, EventStatus, RawEvent, TicketRequest};
