//! SQLite persistence for events and coordinates
//!
//! One file-backed connection per process run (the pipeline is a
//! single-writer batch job). [`repository`] holds the row-level operations;
//! this module owns the connection and the schema.

pub mod repository;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

/// Database handle wrapping the SQLite connection
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (and create if needed) the database file and its schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_schema()?;

        info!(path = %path.display(), "event store opened");
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS event (
                id          TEXT NOT NULL PRIMARY KEY,
                event_type  TEXT NOT NULL,
                gov_sn      TEXT NOT NULL,
                city        TEXT NOT NULL,
                district    TEXT NOT NULL,
                road        TEXT NOT NULL,
                detail_addr TEXT NOT NULL,
                start_date  TEXT NOT NULL,
                end_date    TEXT NOT NULL,
                start_time  TEXT,
                end_time    TEXT,
                description TEXT NOT NULL,
                is_active   INTEGER NOT NULL,
                create_time TEXT NOT NULL,
                update_time TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS coordinate (
                id        TEXT NOT NULL PRIMARY KEY,
                latitude  REAL NOT NULL,
                longitude REAL NOT NULL,
                event_id  TEXT NOT NULL,
                FOREIGN KEY(event_id) REFERENCES event(id)
            );

            CREATE INDEX IF NOT EXISTS idx_event_type_active
                ON event(event_type, is_active);
            CREATE INDEX IF NOT EXISTS idx_event_match
                ON event(gov_sn, event_type);
            CREATE INDEX IF NOT EXISTS idx_coordinate_event
                ON coordinate(event_id);
            "#,
        )?;
        Ok(())
    }

    /// Lock the underlying connection for a batch of operations
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}
