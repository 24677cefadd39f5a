//! Road construction feed adapter
//!
//! Same portal mechanism as the water feed, different resource: each permit
//! record carries ROC date strings, a free-text working-hours string, and a
//! position in the TWD97 survey grid. The grid point is projected to WGS84,
//! reverse-geocoded, and decomposed into location fields.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{FetchError, Result};
use crate::geocode::Geocoder;
use crate::models::{Event, EventType, NewEvent};
use crate::parser::datetime::{parse_time_range, roc_to_date};
use crate::parser::location::parse_address;
use crate::projection::twd97_to_wgs84;
use crate::source::{ensure_success, feed_client, EventSource};

const SOURCE_NAME: &str = "road";

#[derive(Debug, Deserialize)]
struct RoadFeed {
    result: RoadResultSet,
}

#[derive(Debug, Deserialize)]
struct RoadResultSet {
    results: Vec<RoadRecord>,
}

#[derive(Debug, Deserialize)]
struct RoadRecord {
    #[serde(rename = "AC_NO")]
    ac_no: String,
    #[serde(rename = "SNO")]
    sno: String,
    #[serde(rename = "CB_DA")]
    cb_da: String,
    #[serde(rename = "CE_DA")]
    ce_da: String,
    #[serde(rename = "NPURP")]
    npurp: String,
    #[serde(rename = "CO_TI")]
    co_ti: String,
    #[serde(rename = "X")]
    x: String,
    #[serde(rename = "Y")]
    y: String,
}

/// Road construction feed adapter
pub struct RoadSource {
    client: Client,
    url: String,
    geocoder: Arc<dyn Geocoder>,
}

impl RoadSource {
    pub fn new(url: String, timeout_secs: u64, geocoder: Arc<dyn Geocoder>) -> Result<Self> {
        Ok(Self {
            client: feed_client(timeout_secs)?,
            url,
            geocoder,
        })
    }
}

#[async_trait]
impl EventSource for RoadSource {
    fn event_type(&self) -> EventType {
        EventType::Road
    }

    async fn collect(&self) -> Result<Vec<NewEvent>> {
        let response = self.client.get(&self.url).send().await?;
        ensure_success(&response, SOURCE_NAME)?;

        let feed: RoadFeed = response.json().await.map_err(|e| FetchError::MalformedBody {
            source_name: SOURCE_NAME,
            detail: e.to_string(),
        })?;

        let mut events = Vec::new();
        for record in feed.result.results {
            // Permit number plus sub-number; neither is unique on its own.
            let gov_sn = format!("{}#{}", record.ac_no, record.sno);

            let start_date = roc_to_date(&record.cb_da)?;
            let end_date = roc_to_date(&record.ce_da)?;
            let (start_time, end_time) = parse_time_range(&record.co_ti);

            let grid = record
                .x
                .parse::<f64>()
                .and_then(|x| record.y.parse::<f64>().map(|y| (x, y)));
            let (x, y) = match grid {
                Ok(pair) => pair,
                Err(e) => {
                    return Err(FetchError::MalformedBody {
                        source_name: SOURCE_NAME,
                        detail: format!("record {gov_sn}: bad grid coordinate: {e}"),
                    }
                    .into());
                }
            };
            let (latitude, longitude) = twd97_to_wgs84(x, y);

            let address = match self
                .geocoder
                .coordinate_to_address(latitude, longitude)
                .await
            {
                Ok(addr) => addr,
                Err(e) => {
                    warn!(source = SOURCE_NAME, serial = %gov_sn, field = "X/Y",
                        error = %e, "reverse geocode failed, record skipped");
                    continue;
                }
            };
            let parts = parse_address(&address);

            let now = Utc::now();
            let event = Event {
                id: crate::models::new_id(),
                event_type: EventType::Road,
                gov_sn,
                city: parts.city,
                district: parts.district,
                road: parts.road,
                detail_addr: parts.detail,
                start_date,
                end_date,
                start_time,
                end_time,
                description: record.npurp,
                is_active: true,
                create_time: now,
                update_time: now,
            };
            events.push(NewEvent::new(event, vec![(latitude, longitude)]));
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_deserialization() {
        let body = r#"{
            "result": {
                "results": [{
                    "AC_NO": "104B0001",
                    "SNO": "0002",
                    "C_NAME": "大安區",
                    "ADDR": "羅斯福路四段",
                    "CB_DA": "1090601",
                    "CE_DA": "1090615",
                    "NPURP": "管線遷移工程",
                    "CO_TI": "上午8時至下午5時",
                    "X": "298978.8217",
                    "Y": "2774899.7146"
                }]
            }
        }"#;
        let feed: RoadFeed = serde_json::from_str(body).unwrap();
        let record = &feed.result.results[0];
        assert_eq!(record.ac_no, "104B0001");
        assert_eq!(record.x, "298978.8217");
    }
}
