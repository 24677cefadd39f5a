//! Snapshot synchronization
//!
//! One run reconciles one feed's current snapshot against the store:
//!
//! 1. collect the normalized candidates (any fetch problem, or an empty
//!    snapshot, aborts before a single row is touched);
//! 2. inside one transaction, demote every active stored event of the type
//!    to a retirement candidate, then re-match each fresh candidate on the
//!    full composite key — matched rows get their timestamp bumped and
//!    their active flag back, the rest are inserted as new events;
//! 3. commit once. Anything still inactive is a notice the upstream feed no
//!    longer reports. Rows are never deleted.
//!
//! A run that errors after the transaction opened rolls back on drop, so
//! there are no partial commits.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::SyncStats;
use crate::source::EventSource;
use crate::storage::{repository, Database};

/// Drives sync runs against one event store
pub struct Synchronizer<'a> {
    db: &'a Database,
}

impl<'a> Synchronizer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Run one synchronization pass for one source.
    ///
    /// # Errors
    ///
    /// Propagates fetch/normalize failures from the source and database
    /// errors; in both cases the store is left exactly as it was.
    pub async fn run(&self, source: &dyn EventSource) -> Result<SyncStats> {
        let event_type = source.event_type();

        let candidates = source.collect().await?;
        if candidates.is_empty() {
            // A transient upstream outage must never erase known-good data.
            warn!(%event_type, "empty snapshot, keeping previous state untouched");
            return Ok(SyncStats::default());
        }

        let mut stats = SyncStats {
            fetched: candidates.len(),
            ..SyncStats::default()
        };

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;

        let inactive_before = repository::count_by_status(&tx, event_type, false)?;
        repository::retire_active(&tx, event_type)?;

        let now = Utc::now();
        for candidate in &candidates {
            match repository::find_match(&tx, &candidate.event)? {
                Some(id) => {
                    repository::reactivate(&tx, &id, now)?;
                    stats.rematched += 1;
                }
                None => {
                    repository::insert_event(&tx, candidate)?;
                    stats.inserted += 1;
                }
            }
        }

        let inactive_after = repository::count_by_status(&tx, event_type, false)?;
        stats.retired = inactive_after.saturating_sub(inactive_before);

        tx.commit()?;

        info!(
            %event_type,
            fetched = stats.fetched,
            inserted = stats.inserted,
            rematched = stats.rematched,
            retired = stats.retired,
            rematch_rate = stats.rematch_rate(),
            "sync run committed"
        );
        Ok(stats)
    }
}
