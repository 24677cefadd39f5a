//! Water outage feed adapter
//!
//! The municipal open-data portal returns a JSON list of outage notices,
//! each with ROC date strings, a description that embeds the time range and
//! cause, and an affected-area polygon already in WGS84 (GeoJSON
//! `[lon, lat]` point order). Each disjoint ring becomes its own event whose
//! location fields come from reverse-geocoding the ring's first point.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};
use crate::geocode::Geocoder;
use crate::models::{Event, EventType, NewEvent};
use crate::parser::datetime::{parse_time_range, roc_to_date};
use crate::parser::location::{parse_address, parse_outage_cause};
use crate::source::{ensure_success, feed_client, EventSource};

const SOURCE_NAME: &str = "water";

#[derive(Debug, Deserialize)]
struct WaterFeed {
    result: WaterResultSet,
}

#[derive(Debug, Deserialize)]
struct WaterResultSet {
    results: Vec<WaterRecord>,
}

#[derive(Debug, Deserialize)]
struct WaterRecord {
    #[serde(rename = "SW_No")]
    sw_no: String,
    #[serde(rename = "FS_Date")]
    fs_date: String,
    #[serde(rename = "FC_Date")]
    fc_date: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "StopWaterSection_wgs84")]
    section: WaterPolygon,
}

#[derive(Debug, Deserialize)]
struct WaterPolygon {
    /// Rings of [lon, lat] points
    coordinates: Vec<Vec<Vec<f64>>>,
}

/// Water outage feed adapter
pub struct WaterSource {
    client: Client,
    url: String,
    geocoder: Arc<dyn Geocoder>,
}

impl WaterSource {
    pub fn new(url: String, timeout_secs: u64, geocoder: Arc<dyn Geocoder>) -> Result<Self> {
        Ok(Self {
            client: feed_client(timeout_secs)?,
            url,
            geocoder,
        })
    }
}

#[async_trait]
impl EventSource for WaterSource {
    fn event_type(&self) -> EventType {
        EventType::Water
    }

    async fn collect(&self) -> Result<Vec<NewEvent>> {
        let response = self.client.get(&self.url).send().await?;
        ensure_success(&response, SOURCE_NAME)?;

        let feed: WaterFeed = response.json().await.map_err(|e| FetchError::MalformedBody {
            source_name: SOURCE_NAME,
            detail: e.to_string(),
        })?;

        let mut events = Vec::new();
        for record in feed.result.results {
            let start_date = roc_to_date(&record.fs_date)?;
            let end_date = roc_to_date(&record.fc_date)?;
            let (start_time, end_time) = parse_time_range(&record.description);

            // The feed buries the human-readable cause inside the sentence
            // that also carries the time range; keep the whole description
            // when the cause clause cannot be isolated.
            let description = match parse_outage_cause(&record.description) {
                Some(cause) => cause,
                None => {
                    debug!(source = SOURCE_NAME, serial = %record.sw_no,
                        "no cause clause found, keeping full description");
                    record.description.clone()
                }
            };

            // One event per disjoint ring; rings share the notice serial.
            for ring in &record.section.coordinates {
                let points: Vec<(f64, f64)> = ring
                    .iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| (p[1], p[0]))
                    .collect();

                let Some(&(lat, lon)) = points.first() else {
                    warn!(source = SOURCE_NAME, serial = %record.sw_no,
                        "ring without coordinates skipped");
                    continue;
                };

                let address = match self.geocoder.coordinate_to_address(lat, lon).await {
                    Ok(addr) => addr,
                    Err(e) => {
                        warn!(source = SOURCE_NAME, serial = %record.sw_no,
                            field = "coordinates", error = %e,
                            "reverse geocode failed, ring skipped");
                        continue;
                    }
                };
                let parts = parse_address(&address);

                let now = Utc::now();
                let event = Event {
                    id: crate::models::new_id(),
                    event_type: EventType::Water,
                    gov_sn: record.sw_no.clone(),
                    city: parts.city,
                    district: parts.district,
                    road: parts.road,
                    detail_addr: parts.detail,
                    start_date,
                    end_date,
                    start_time,
                    end_time,
                    description: description.clone(),
                    is_active: true,
                    create_time: now,
                    update_time: now,
                };
                events.push(NewEvent::new(event, points));
            }
        }

        Ok(events)
    }
}
