use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::geocode::{Geocoder, GoogleGeocoder};
use crate::models::EventType;
use crate::source::{EventSource, PowerSource, RoadSource, WaterSource};
use crate::storage::Database;
use crate::sync::Synchronizer;

/// Run one sync pass for one source, or for all three.
///
/// The three feeds are independent: a failing run is logged and the
/// remaining feeds still sync; the command exits non-zero if any run
/// failed so an external scheduler can re-invoke it.
pub async fn sync(config: Config, only: Option<String>) -> Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).with_context(|| {
        format!(
            "Failed to open event store at {}",
            config.database.path.display()
        )
    })?;
    let geocoder: Arc<dyn Geocoder> =
        Arc::new(GoogleGeocoder::new(&config.geocoding).context("Failed to create geocoder")?);

    let types: Vec<EventType> = match only {
        Some(name) => {
            let ty = EventType::parse(&name)
                .with_context(|| format!("Unknown source {name:?} (water, road, power)"))?;
            vec![ty]
        }
        None => EventType::all().to_vec(),
    };

    let synchronizer = Synchronizer::new(&db);
    let mut failures = 0usize;

    for event_type in types {
        let source = match build_source(event_type, &config, Arc::clone(&geocoder)) {
            Ok(source) => source,
            Err(e) => {
                error!(%event_type, error = %e, "could not build source");
                failures += 1;
                continue;
            }
        };

        match synchronizer.run(source.as_ref()).await {
            Ok(stats) => info!(
                %event_type,
                fetched = stats.fetched,
                inserted = stats.inserted,
                rematched = stats.rematched,
                retired = stats.retired,
                "sync finished"
            ),
            Err(e) => {
                error!(%event_type, error = %e, recoverable = e.is_recoverable(),
                    "sync run failed, store unchanged");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} sync run(s) failed");
    }
    Ok(())
}

fn build_source(
    event_type: EventType,
    config: &Config,
    geocoder: Arc<dyn Geocoder>,
) -> crate::error::Result<Box<dyn EventSource>> {
    let timeout = config.feeds.request_timeout_secs;
    let source: Box<dyn EventSource> = match event_type {
        EventType::Water => Box::new(WaterSource::new(
            config.feeds.water_url.clone(),
            timeout,
            geocoder,
        )?),
        EventType::Road => Box::new(RoadSource::new(
            config.feeds.road_url.clone(),
            timeout,
            geocoder,
        )?),
        EventType::Power => {
            let url = match config.feeds.power_mode {
                crate::config::PowerFeedMode::Archive => config.feeds.power_archive_url.clone(),
                crate::config::PowerFeedMode::Bulletin => config.feeds.power_bulletin_url.clone(),
            };
            Box::new(PowerSource::new(
                config.feeds.power_mode,
                url,
                timeout,
                geocoder,
            )?)
        }
    };
    Ok(source)
}
