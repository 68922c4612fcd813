use async_trait::async_trait;

use super::DatabaseError;
use super::models::{CpLogEntry, NewCpLogEntry, NewWatchItem, WatchItem};

#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Items of one guild in insertion order.
    async fn list_watch_items(&self, guild_id: &str) -> Result<Vec<WatchItem>, DatabaseError>;
    /// Inserts a new item, assigning `1 + max(id)` for the guild while holding
    /// the guild's write lock.
    async fn create_watch_item(&self, item: &NewWatchItem) -> Result<WatchItem, DatabaseError>;
    /// Upserts the item keyed by guild + subreddit.
    async fn save_watch_item(&self, item: &WatchItem) -> Result<(), DatabaseError>;
    /// Moves the row stored under `item.subreddit` to `subreddit` in a single
    /// statement, also writing `item.channel`.
    async fn rename_watch_item(&self, item: &WatchItem, subreddit: &str)
    -> Result<(), DatabaseError>;
    async fn delete_watch_item(&self, item: &WatchItem) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_log_entry(&self, entry: &NewCpLogEntry) -> Result<(), DatabaseError>;
    async fn list_log_entries(
        &self,
        guild_id: &str,
        limit: i64,
    ) -> Result<Vec<CpLogEntry>, DatabaseError>;
}
