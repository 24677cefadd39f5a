use anyhow::{Context, Result};

use crate::config::Config;
use crate::storage::Database;

/// Create the event store schema (idempotent)
pub fn init_db(config: &Config) -> Result<()> {
    Database::open(&config.database.path).with_context(|| {
        format!(
            "Failed to initialize event store at {}",
            config.database.path.display()
        )
    })?;
    println!("Event store ready at {}", config.database.path.display());
    Ok(())
}
