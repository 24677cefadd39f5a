// Core data structures for the civicsync pipeline

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of civic disruption a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Water,
    Road,
    Power,
}

impl EventType {
    /// Get string representation (used as the database discriminator)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Road => "road",
            Self::Power => "power",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "water" => Some(Self::Water),
            "road" => Some(Self::Road),
            "power" => Some(Self::Power),
            _ => None,
        }
    }

    /// Get all event types in sync order
    pub fn all() -> [Self; 3] {
        [Self::Water, Self::Road, Self::Power]
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One disruption record
///
/// `city`/`district`/`road`/`detail_addr` always hold a value; when the
/// address extractor finds nothing they carry its `"null"` sentinel rather
/// than being absent. Events are never deleted, only demoted to inactive
/// when a newer upstream snapshot no longer reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: EventType,
    /// Government serial number; source-specific format, reused upstream
    /// across unrelated notices, so never treated as unique on its own.
    pub gov_sn: String,
    pub city: String,
    pub district: String,
    pub road: String,
    pub detail_addr: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: String,
    pub is_active: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Event {
    /// The composite key used to re-match a candidate against stored rows.
    ///
    /// Every descriptive field participates: a notice whose schedule or
    /// wording changed upstream must become a new event, not an update,
    /// because serial numbers are reused across unrelated notices.
    pub fn match_key(&self) -> EventKey<'_> {
        EventKey {
            gov_sn: &self.gov_sn,
            event_type: self.event_type,
            city: &self.city,
            district: &self.district,
            road: &self.road,
            detail_addr: &self.detail_addr,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            description: &self.description,
        }
    }
}

/// Borrowed view of the fields that make two events "the same notice"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKey<'a> {
    pub gov_sn: &'a str,
    pub event_type: EventType,
    pub city: &'a str,
    pub district: &'a str,
    pub road: &'a str,
    pub detail_addr: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: &'a str,
}

/// One point of an event's affected-area outline (WGS84 degrees)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinate {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub event_id: String,
}

/// A normalized candidate produced by a source, not yet persisted
///
/// Coordinates are kept as bare (lat, lon) pairs; ids and the owning event
/// reference are assigned at insert time.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event: Event,
    pub points: Vec<(f64, f64)>,
}

impl NewEvent {
    pub fn new(event: Event, points: Vec<(f64, f64)>) -> Self {
        Self { event, points }
    }
}

/// Generate an opaque event/coordinate id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Outcome counters for one sync run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncStats {
    /// Candidates normalized from the upstream snapshot
    pub fetched: usize,
    /// Candidates inserted as new active events
    pub inserted: usize,
    /// Stored events re-matched and kept active
    pub rematched: usize,
    /// Stored events left inactive after the run
    pub retired: usize,
}

impl SyncStats {
    /// Fraction of candidates that matched an existing row (0.0 - 1.0)
    pub fn rematch_rate(&self) -> f64 {
        if self.fetched == 0 {
            return 0.0;
        }
        self.rematched as f64 / self.fetched as f64
    }
}
