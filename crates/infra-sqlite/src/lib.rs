// Transflow Infrastructure - SQLite Adapter
// Implements: SnapshotStore

mod connection;
mod migration;
mod snapshot_store;

pub use connection::{create_pool, database_url};
pub use migration::{current_version, run_migrations};
pub use snapshot_store::SqliteSnapshotStore;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
