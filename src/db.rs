pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{NewCpLogEntry, NewWatchItem, WatchItem};
pub use self::stores::{AuditStore, WatchStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod stores;

#[cfg(test)]
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod schema;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub mod schema_sqlite;
