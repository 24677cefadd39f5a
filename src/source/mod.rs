//! Upstream feed adapters
//!
//! One adapter per civic feed, all behind [`EventSource`]: the synchronizer
//! only sees an event type and a `collect` call that yields fully normalized
//! candidates. Adding a feed means adding one implementation, not touching
//! the sync logic.
//!
//! Fetch problems (transport, non-success status, undeserializable body)
//! abort the whole collect so a broken upstream never erases known-good
//! stored data. Per-record geocoding problems only skip that record.

pub mod power;
pub mod road;
pub mod water;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{FetchError, Result};
use crate::models::{EventType, NewEvent};

pub use power::PowerSource;
pub use road::RoadSource;
pub use water::WaterSource;

/// A feed that can be synchronized into the event store
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Which event type this source produces
    fn event_type(&self) -> EventType;

    /// Fetch the current upstream snapshot and normalize it into candidate
    /// events. An error means the snapshot is unusable as a whole.
    async fn collect(&self) -> Result<Vec<NewEvent>>;
}

/// Shared HTTP client shape for all feed adapters
pub(crate) fn feed_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .build()
        .map_err(|e| FetchError::Http(e).into())
}

/// Fail fast on a non-success feed response
pub(crate) fn ensure_success(
    response: &reqwest::Response,
    source_name: &'static str,
) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::ServerError {
            source_name,
            status: status.as_u16(),
        }
        .into());
    }
    Ok(())
}
