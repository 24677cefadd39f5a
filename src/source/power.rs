//! Power outage feed adapter
//!
//! Two upstream variants describe the same notices:
//!
//! - the open-data archive's `#`-delimited text (the zip download and
//!   extraction live in an external collaborator; this adapter reads the
//!   extracted text over HTTP), where each line may declare a first and an
//!   optional second working period;
//! - the utility's HTML bulletin table, one working period per row.
//!
//! Either way a record's address is already textual, so location fields are
//! parsed straight from it and a single forward geocode yields the point
//! shared by every working period of the record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use tracing::warn;

use crate::config::PowerFeedMode;
use crate::error::Result;
use crate::geocode::Geocoder;
use crate::models::{Event, EventType, NewEvent};
use crate::parser::bulletin::parse_bulletin;
use crate::parser::datetime::parse_power_period;
use crate::parser::location::parse_address;
use crate::source::{ensure_success, feed_client, EventSource};

const SOURCE_NAME: &str = "power";

/// Marker the archive writes when a record has no second working period
const NO_SECOND_PERIOD: &str = "無";

/// One working window of an outage record
#[derive(Debug, Clone)]
struct WorkPeriod {
    date: NaiveDate,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
}

/// Feed-variant-independent raw record
#[derive(Debug, Clone)]
struct PowerRecord {
    serial: String,
    description: String,
    address: String,
    periods: Vec<WorkPeriod>,
}

/// Power outage feed adapter
pub struct PowerSource {
    client: Client,
    mode: PowerFeedMode,
    url: String,
    geocoder: Arc<dyn Geocoder>,
}

impl PowerSource {
    pub fn new(
        mode: PowerFeedMode,
        url: String,
        timeout_secs: u64,
        geocoder: Arc<dyn Geocoder>,
    ) -> Result<Self> {
        Ok(Self {
            client: feed_client(timeout_secs)?,
            mode,
            url,
            geocoder,
        })
    }
}

#[async_trait]
impl EventSource for PowerSource {
    fn event_type(&self) -> EventType {
        EventType::Power
    }

    async fn collect(&self) -> Result<Vec<NewEvent>> {
        let response = self.client.get(&self.url).send().await?;
        ensure_success(&response, SOURCE_NAME)?;
        let body = response.text().await?;

        let records = match self.mode {
            PowerFeedMode::Archive => parse_archive_text(&body),
            PowerFeedMode::Bulletin => parse_bulletin_page(&body),
        };

        let mut events = Vec::new();
        for record in records {
            let (latitude, longitude) =
                match self.geocoder.address_to_coordinate(&record.address).await {
                    Ok(point) => point,
                    Err(e) => {
                        warn!(source = SOURCE_NAME, serial = %record.serial,
                            field = "address", error = %e,
                            "forward geocode failed, record skipped");
                        continue;
                    }
                };

            let parts = parse_address(&record.address);

            // Both periods of a record describe the same location; the
            // geocoded point is shared.
            for period in &record.periods {
                let now = Utc::now();
                let event = Event {
                    id: crate::models::new_id(),
                    event_type: EventType::Power,
                    gov_sn: record.serial.clone(),
                    city: parts.city.clone(),
                    district: parts.district.clone(),
                    road: parts.road.clone(),
                    detail_addr: parts.detail.clone(),
                    start_date: period.date,
                    end_date: period.date,
                    start_time: period.start,
                    end_time: period.end,
                    description: record.description.clone(),
                    is_active: true,
                    create_time: now,
                    update_time: now,
                };
                events.push(NewEvent::new(event, vec![(latitude, longitude)]));
            }
        }

        Ok(events)
    }
}

/// Parse the archive's `#`-delimited text.
///
/// The first line is a header. Field layout per line:
/// `[unused, serial, description, period-1, period-2, address, ...]`.
/// Lines that cannot be read are logged and skipped.
fn parse_archive_text(body: &str) -> Vec<PowerRecord> {
    let mut records = Vec::new();

    for line in body.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('#').collect();
        if fields.len() < 6 {
            warn!(source = SOURCE_NAME, field_count = fields.len(),
                "short archive line skipped");
            continue;
        }

        let serial = fields[1].to_string();
        let Some((date, start, end)) = parse_power_period(fields[3]) else {
            warn!(source = SOURCE_NAME, serial = %serial, field = "period-1",
                "unparsable first working period, record skipped");
            continue;
        };
        let mut periods = vec![WorkPeriod {
            date,
            start: Some(start),
            end: Some(end),
        }];

        // Second period only when declared.
        if fields[4] != NO_SECOND_PERIOD {
            match parse_power_period(fields[4]) {
                Some((date, start, end)) => periods.push(WorkPeriod {
                    date,
                    start: Some(start),
                    end: Some(end),
                }),
                None => warn!(source = SOURCE_NAME, serial = %serial, field = "period-2",
                    "unparsable second working period ignored"),
            }
        }

        records.push(PowerRecord {
            serial,
            description: fields[2].to_string(),
            address: fields[5].to_string(),
            periods,
        });
    }

    records
}

/// Parse the HTML bulletin into the same record shape (one period per row).
fn parse_bulletin_page(body: &str) -> Vec<PowerRecord> {
    parse_bulletin(body)
        .into_iter()
        .map(|row| PowerRecord {
            serial: row.serial,
            description: row.description,
            address: row.address,
            periods: vec![WorkPeriod {
                date: row.date,
                start: row.start_time,
                end: row.end_time,
            }],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str = "\
別處號碼#通知單號碼#工作概要#第一次停電期間#第二次停電期間#停電地區#備註\n\
0#D1090601001#配合道路拓寬#2020/06/01 09:00~12:00#2020/06/01 13:30~17:00#台北市大安區羅斯福路四段1號#無\n\
0#D1090601002#設備檢修#2020/06/02 08:00~11:00#無#台北市中山區林森北路67號#無\n";

    #[test]
    fn test_archive_lines_parsed() {
        let records = parse_archive_text(ARCHIVE);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.serial, "D1090601001");
        assert_eq!(first.description, "配合道路拓寬");
        assert_eq!(first.address, "台北市大安區羅斯福路四段1號");
        assert_eq!(first.periods.len(), 2);
        assert_eq!(
            first.periods[1].date,
            NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
        );
        assert_eq!(first.periods[1].start, NaiveTime::from_hms_opt(13, 30, 0));
    }

    #[test]
    fn test_second_period_marker_respected() {
        let records = parse_archive_text(ARCHIVE);
        assert_eq!(records[1].periods.len(), 1);
    }

    #[test]
    fn test_header_and_short_lines_skipped() {
        let body = "header line\nbroken#line\n";
        assert!(parse_archive_text(body).is_empty());
    }
}
