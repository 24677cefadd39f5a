//! civicsync - Taipei civic-disruption feed synchronizer
//!
//! Ingests the municipal water-outage and road-construction feeds and the
//! utility's power-outage notices, normalizes them into geocoded Event +
//! Coordinate records, and reconciles each upstream snapshot against a
//! SQLite store so consumers can tell current notices from superseded ones.
//!
//! # Architecture
//!
//! - [`config`] - Configuration loading and validation
//! - [`source`] - One adapter per feed behind the [`source::EventSource`] trait
//! - [`parser`] - ROC dates, day-part time ranges, address decomposition,
//!   power bulletin tables
//! - [`projection`] - TWD97 survey grid to WGS84 conversion
//! - [`geocode`] - Forward/reverse lookups through the geocoding service
//! - [`models`] - Core data structures
//! - [`storage`] - SQLite event store
//! - [`sync`] - The per-run retire / rematch / insert reconciliation
//!
//! # Example
//!
//! ```no_run
//! use civicsync::config::Config;
//! use civicsync::storage::Database;
//! use civicsync::sync::Synchronizer;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env();
//! let db = Database::open(&config.database.path)?;
//! let synchronizer = Synchronizer::new(&db);
//! // synchronizer.run(&source).await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod geocode;
pub mod models;
pub mod parser;
pub mod projection;
pub mod source;
pub mod storage;
pub mod sync;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::geocode::{Geocoder, GoogleGeocoder};
    pub use crate::models::{Coordinate, Event, EventType, NewEvent, SyncStats};
    pub use crate::source::EventSource;
    pub use crate::storage::Database;
    pub use crate::sync::Synchronizer;
}

// Direct re-exports for convenience
pub use models::{Event, EventType, SyncStats};
