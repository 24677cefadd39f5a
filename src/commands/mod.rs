pub mod init_db;
pub mod sync;

// Re-export command functions for convenience
pub use init_db::init_db;
pub use sync::sync;
