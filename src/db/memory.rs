//! In-process stores used by handler and audit tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{
    AuditStore, DatabaseError, WatchStore,
    models::{CpLogEntry, NewCpLogEntry, NewWatchItem, WatchItem},
};

#[derive(Default)]
pub struct MemoryWatchStore {
    items: Mutex<Vec<WatchItem>>,
    pub fail_list: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_renames: AtomicBool,
}

impl MemoryWatchStore {
    pub fn with_items(items: Vec<WatchItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<WatchItem> {
        self.items.lock().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_renames(&self, fail: bool) {
        self.fail_renames.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), DatabaseError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection("store unavailable".to_string()));
        }
        Ok(())
    }
}

/// Mirrors the `(guild_id, lower(subreddit))` unique index.
fn same_subreddit(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl WatchStore for MemoryWatchStore {
    async fn list_watch_items(&self, guild_id: &str) -> Result<Vec<WatchItem>, DatabaseError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection("store unavailable".to_string()));
        }
        Ok(self
            .items
            .lock()
            .iter()
            .filter(|item| item.guild == guild_id)
            .cloned()
            .collect())
    }

    async fn create_watch_item(&self, item: &NewWatchItem) -> Result<WatchItem, DatabaseError> {
        self.check_writes()?;
        let mut items = self.items.lock();
        if items
            .iter()
            .any(|existing| existing.guild == item.guild && same_subreddit(&existing.subreddit, &item.subreddit))
        {
            return Err(DatabaseError::Conflict(item.subreddit.clone()));
        }

        let highest = items
            .iter()
            .filter(|existing| existing.guild == item.guild)
            .map(|existing| existing.id)
            .max()
            .unwrap_or(0);
        let created = WatchItem {
            id: highest + 1,
            subreddit: item.subreddit.clone(),
            channel: item.channel.clone(),
            guild: item.guild.clone(),
        };
        items.push(created.clone());
        Ok(created)
    }

    async fn save_watch_item(&self, item: &WatchItem) -> Result<(), DatabaseError> {
        self.check_writes()?;
        let mut items = self.items.lock();
        match items
            .iter_mut()
            .find(|existing| existing.guild == item.guild && existing.subreddit == item.subreddit)
        {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    async fn rename_watch_item(
        &self,
        item: &WatchItem,
        subreddit: &str,
    ) -> Result<(), DatabaseError> {
        self.check_writes()?;
        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("rename rejected".to_string()));
        }
        let mut items = self.items.lock();
        if items.iter().any(|other| {
            other.guild == item.guild
                && other.subreddit != item.subreddit
                && same_subreddit(&other.subreddit, subreddit)
        }) {
            return Err(DatabaseError::Conflict(subreddit.to_string()));
        }
        let existing = items
            .iter_mut()
            .find(|existing| existing.guild == item.guild && existing.subreddit == item.subreddit)
            .ok_or_else(|| DatabaseError::NotFound(item.subreddit.clone()))?;
        existing.subreddit = subreddit.to_string();
        existing.channel = item.channel.clone();
        Ok(())
    }

    async fn delete_watch_item(&self, item: &WatchItem) -> Result<(), DatabaseError> {
        self.check_writes()?;
        self.items
            .lock()
            .retain(|existing| !(existing.guild == item.guild && existing.subreddit == item.subreddit));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAuditStore {
    entries: Mutex<Vec<CpLogEntry>>,
    pub fail_inserts: AtomicBool,
    pub fail_list: AtomicBool,
}

impl MemoryAuditStore {
    pub fn actions(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert_log_entry(&self, entry: &NewCpLogEntry) -> Result<(), DatabaseError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection("audit store unavailable".to_string()));
        }
        let mut entries = self.entries.lock();
        let id = entries.len() as i64 + 1;
        entries.push(CpLogEntry {
            id,
            guild_id: entry.guild_id.clone(),
            actor_id: entry.actor_id.clone(),
            actor_name: entry.actor_name.clone(),
            action: entry.action.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_log_entries(
        &self,
        guild_id: &str,
        limit: i64,
    ) -> Result<Vec<CpLogEntry>, DatabaseError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection("audit store unavailable".to_string()));
        }
        Ok(self
            .entries
            .lock()
            .iter()
            .rev()
            .filter(|entry| entry.guild_id == guild_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
