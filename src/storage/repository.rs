//! Row-level event store operations
//!
//! All mutating functions take a plain `&Connection` so they run equally
//! inside a transaction (`rusqlite::Transaction` derefs to `Connection`);
//! the synchronizer stages a whole run against one transaction and commits
//! once.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::Result;
use crate::models::{Coordinate, Event, EventType, NewEvent};

/// Demote every active event of a type to inactive, returning how many rows
/// were touched. Matched candidates are restored afterwards; anything left
/// inactive is a notice the upstream snapshot no longer reports.
pub fn retire_active(conn: &Connection, event_type: EventType) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE event SET is_active = 0 WHERE event_type = ?1 AND is_active = 1",
        params![event_type.as_str()],
    )?;
    Ok(changed)
}

/// Find a stored event matching the candidate's full composite key.
///
/// Rows are narrowed by the indexed (gov_sn, event_type) pair, then compared
/// through [`Event::match_key`] so the key definition lives in one place.
/// Every descriptive field participates in the match; serial numbers are
/// reused upstream across unrelated notices, so a serial-only match would
/// silently merge distinct events.
pub fn find_match(conn: &Connection, candidate: &Event) -> Result<Option<String>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, gov_sn, city, district, road, detail_addr,
                start_date, end_date, start_time, end_time, description,
                is_active, create_time, update_time
         FROM event WHERE gov_sn = ?1 AND event_type = ?2",
    )?;
    let rows = stmt.query_map(
        params![candidate.gov_sn, candidate.event_type.as_str()],
        row_to_event,
    )?;

    let key = candidate.match_key();
    for row in rows {
        let stored = row?;
        if stored.match_key() == key {
            return Ok(Some(stored.id));
        }
    }
    Ok(None)
}

/// Restore a matched event to active and bump its update timestamp
pub fn reactivate(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE event SET is_active = 1, update_time = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    Ok(())
}

/// Insert a candidate event together with its coordinates
pub fn insert_event(conn: &Connection, candidate: &NewEvent) -> Result<()> {
    let e = &candidate.event;
    conn.execute(
        "INSERT INTO event (id, event_type, gov_sn, city, district, road, detail_addr,
                            start_date, end_date, start_time, end_time, description,
                            is_active, create_time, update_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            e.id,
            e.event_type.as_str(),
            e.gov_sn,
            e.city,
            e.district,
            e.road,
            e.detail_addr,
            e.start_date,
            e.end_date,
            e.start_time,
            e.end_time,
            e.description,
            e.is_active,
            e.create_time,
            e.update_time,
        ],
    )?;

    for &(latitude, longitude) in &candidate.points {
        conn.execute(
            "INSERT INTO coordinate (id, latitude, longitude, event_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![crate::models::new_id(), latitude, longitude, e.id],
        )?;
    }
    Ok(())
}

/// Count events of a type by lifecycle status
pub fn count_by_status(conn: &Connection, event_type: EventType, active: bool) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM event WHERE event_type = ?1 AND is_active = ?2",
        params![event_type.as_str(), active],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Load all events of a type, newest update first
pub fn events_by_type(conn: &Connection, event_type: EventType) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, gov_sn, city, district, road, detail_addr,
                start_date, end_date, start_time, end_time, description,
                is_active, create_time, update_time
         FROM event WHERE event_type = ?1
         ORDER BY update_time DESC, id",
    )?;
    let rows = stmt.query_map(params![event_type.as_str()], row_to_event)?;
    let mut events = Vec::new();
    for event in rows {
        events.push(event?);
    }
    Ok(events)
}

/// Load the coordinates belonging to an event
pub fn coordinates_of(conn: &Connection, event_id: &str) -> Result<Vec<Coordinate>> {
    let mut stmt = conn.prepare(
        "SELECT id, latitude, longitude, event_id FROM coordinate
         WHERE event_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![event_id], |row| {
        Ok(Coordinate {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            event_id: row.get(3)?,
        })
    })?;
    let mut coordinates = Vec::new();
    for coordinate in rows {
        coordinates.push(coordinate?);
    }
    Ok(coordinates)
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    let type_str: String = row.get(1)?;
    let event_type = EventType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown event type: {type_str}").into(),
        )
    })?;

    Ok(Event {
        id: row.get(0)?,
        event_type,
        gov_sn: row.get(2)?,
        city: row.get(3)?,
        district: row.get(4)?,
        road: row.get(5)?,
        detail_addr: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        start_time: row.get(9)?,
        end_time: row.get(10)?,
        description: row.get(11)?,
        is_active: row.get(12)?,
        create_time: row.get(13)?,
        update_time: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_id;
    use crate::storage::Database;
    use chrono::{NaiveDate, NaiveTime};

    fn candidate(gov_sn: &str, start_time: Option<NaiveTime>) -> NewEvent {
        let now = Utc::now();
        NewEvent::new(
            Event {
                id: new_id(),
                event_type: EventType::Water,
                gov_sn: gov_sn.to_string(),
                city: "台北市".to_string(),
                district: "大安區".to_string(),
                road: "羅斯福路四段".to_string(),
                detail_addr: "".to_string(),
                start_date: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2020, 6, 2).unwrap(),
                start_time,
                end_time: NaiveTime::from_hms_opt(18, 0, 0),
                description: "送水管汰換工程".to_string(),
                is_active: true,
                create_time: now,
                update_time: now,
            },
            vec![(25.0171, 121.5339), (25.0172, 121.5340)],
        )
    }

    #[test]
    fn test_insert_and_load_roundtrip() {
        let db = Database::in_memory().unwrap();
        let conn = db.lock();

        let c = candidate("W-1", NaiveTime::from_hms_opt(9, 0, 0));
        insert_event(&conn, &c).unwrap();

        let events = events_by_type(&conn, EventType::Water).unwrap();
        assert_eq!(events.len(), 1);
        let loaded = &events[0];
        assert_eq!(loaded.gov_sn, "W-1");
        assert_eq!(loaded.start_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert!(loaded.is_active);

        let coords = coordinates_of(&conn, &loaded.id).unwrap();
        assert_eq!(coords.len(), 2);
        assert!((coords[0].latitude - 25.0171).abs() < 1e-9);
        assert_eq!(coords[0].event_id, loaded.id);
    }

    #[test]
    fn test_match_on_composite_key() {
        let db = Database::in_memory().unwrap();
        let conn = db.lock();

        let stored = candidate("W-1", NaiveTime::from_hms_opt(9, 0, 0));
        insert_event(&conn, &stored).unwrap();

        // Same key fields, different identity
        let same = candidate("W-1", NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(
            find_match(&conn, &same.event).unwrap(),
            Some(stored.event.id.clone())
        );

        // One changed field breaks the match
        let changed = candidate("W-1", NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(find_match(&conn, &changed.event).unwrap(), None);
    }

    #[test]
    fn test_match_with_null_times() {
        let db = Database::in_memory().unwrap();
        let conn = db.lock();

        let mut stored = candidate("W-2", None);
        stored.event.end_time = None;
        insert_event(&conn, &stored).unwrap();

        let mut probe = candidate("W-2", None);
        probe.event.end_time = None;
        assert!(find_match(&conn, &probe.event).unwrap().is_some());

        // NULL start_time must not match a concrete one
        let concrete = candidate("W-2", NaiveTime::from_hms_opt(9, 0, 0));
        assert!(find_match(&conn, &concrete.event).unwrap().is_none());
    }

    #[test]
    fn test_find_match_agrees_with_match_key() {
        let db = Database::in_memory().unwrap();
        let conn = db.lock();

        let stored = candidate("W-1", NaiveTime::from_hms_opt(9, 0, 0));
        insert_event(&conn, &stored).unwrap();

        // Perturb each descriptive field in turn; the lookup must report a
        // match exactly when the in-memory keys compare equal.
        let mut variants = Vec::new();
        for field in ["district", "road", "detail_addr", "description"] {
            let mut v = candidate("W-1", NaiveTime::from_hms_opt(9, 0, 0));
            match field {
                "district" => v.event.district = "中正區".to_string(),
                "road" => v.event.road = "羅斯福路五段".to_string(),
                "detail_addr" => v.event.detail_addr = "2號".to_string(),
                _ => v.event.description = "管線遷移工程".to_string(),
            }
            variants.push(v.event);
        }
        variants.push(candidate("W-1", NaiveTime::from_hms_opt(9, 0, 0)).event);

        for probe in &variants {
            let found = find_match(&conn, probe).unwrap().is_some();
            let keys_equal = probe.match_key() == stored.event.match_key();
            assert_eq!(found, keys_equal);
        }
    }

    #[test]
    fn test_retire_and_reactivate() {
        let db = Database::in_memory().unwrap();
        let conn = db.lock();

        let c = candidate("W-1", None);
        insert_event(&conn, &c).unwrap();
        assert_eq!(retire_active(&conn, EventType::Water).unwrap(), 1);
        assert_eq!(count_by_status(&conn, EventType::Water, true).unwrap(), 0);

        reactivate(&conn, &c.event.id, Utc::now()).unwrap();
        assert_eq!(count_by_status(&conn, EventType::Water, true).unwrap(), 1);

        // Other types untouched
        assert_eq!(retire_active(&conn, EventType::Road).unwrap(), 0);
    }
}
