use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::{cp_log_entries, subreddit_watch_items};

use super::{
    DatabaseError,
    models::{CpLogEntry, NewCpLogEntry, NewWatchItem, WatchItem},
};

fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subreddit_watch_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbWatchItem {
    guild_id: String,
    item_id: i32,
    subreddit: String,
    channel_id: String,
}

impl From<DbWatchItem> for WatchItem {
    fn from(value: DbWatchItem) -> Self {
        Self {
            id: value.item_id,
            subreddit: value.subreddit,
            channel: value.channel_id,
            guild: value.guild_id,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = subreddit_watch_items)]
struct NewDbWatchItem<'a> {
    guild_id: &'a str,
    item_id: i32,
    subreddit: &'a str,
    channel_id: &'a str,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cp_log_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbCpLogEntry {
    id: i32,
    guild_id: String,
    actor_id: String,
    actor_name: String,
    action: String,
    created_at: String,
}

impl DbCpLogEntry {
    fn to_log_entry(&self) -> Result<CpLogEntry, DatabaseError> {
        Ok(CpLogEntry {
            id: self.id as i64,
            guild_id: self.guild_id.clone(),
            actor_id: self.actor_id.clone(),
            actor_name: self.actor_name.clone(),
            action: self.action.clone(),
            created_at: string_to_datetime(&self.created_at)?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = cp_log_entries)]
struct NewDbCpLogEntry<'a> {
    guild_id: &'a str,
    actor_id: &'a str,
    actor_name: &'a str,
    action: &'a str,
    created_at: String,
}

const BUSY_TIMEOUT_MS: u32 = 5000;

fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    let mut conn = SqliteConnection::establish(path)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    conn.batch_execute(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"))
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    Ok(conn)
}

pub struct SqliteWatchStore {
    db_path: Arc<String>,
}

impl SqliteWatchStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::WatchStore for SqliteWatchStore {
    async fn list_watch_items(&self, guild: &str) -> Result<Vec<WatchItem>, DatabaseError> {
        let guild = guild.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let rows = subreddit_watch_items::table
                .filter(subreddit_watch_items::guild_id.eq(&guild))
                .order(subreddit_watch_items::id.asc())
                .select(DbWatchItem::as_select())
                .load::<DbWatchItem>(&mut conn)?;

            Ok(rows.into_iter().map(WatchItem::from).collect())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn create_watch_item(&self, item: &NewWatchItem) -> Result<WatchItem, DatabaseError> {
        let item = item.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            // BEGIN IMMEDIATE takes the write lock before reading the current max.
            conn.immediate_transaction::<_, DatabaseError, _>(|conn| {
                let highest: Option<i32> = subreddit_watch_items::table
                    .filter(subreddit_watch_items::guild_id.eq(&item.guild))
                    .select(max(subreddit_watch_items::item_id))
                    .get_result(conn)?;
                let next_id = highest.unwrap_or(0) + 1;

                let now = datetime_to_string(&Utc::now());
                let row = NewDbWatchItem {
                    guild_id: &item.guild,
                    item_id: next_id,
                    subreddit: &item.subreddit,
                    channel_id: &item.channel,
                    created_at: now.clone(),
                    updated_at: now,
                };
                diesel::insert_into(subreddit_watch_items::table)
                    .values(&row)
                    .execute(conn)?;

                Ok(WatchItem {
                    id: next_id,
                    subreddit: item.subreddit.clone(),
                    channel: item.channel.clone(),
                    guild: item.guild.clone(),
                })
            })
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn save_watch_item(&self, item: &WatchItem) -> Result<(), DatabaseError> {
        let item = item.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let now = datetime_to_string(&Utc::now());
            let row = NewDbWatchItem {
                guild_id: &item.guild,
                item_id: item.id,
                subreddit: &item.subreddit,
                channel_id: &item.channel,
                created_at: now.clone(),
                updated_at: now.clone(),
            };

            diesel::insert_into(subreddit_watch_items::table)
                .values(&row)
                .on_conflict((
                    subreddit_watch_items::guild_id,
                    subreddit_watch_items::subreddit,
                ))
                .do_update()
                .set((
                    subreddit_watch_items::item_id.eq(item.id),
                    subreddit_watch_items::channel_id.eq(&item.channel),
                    subreddit_watch_items::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(DatabaseError::from)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn rename_watch_item(
        &self,
        item: &WatchItem,
        subreddit: &str,
    ) -> Result<(), DatabaseError> {
        let item = item.clone();
        let new_subreddit = subreddit.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let updated = diesel::update(
                subreddit_watch_items::table
                    .filter(subreddit_watch_items::guild_id.eq(&item.guild))
                    .filter(subreddit_watch_items::subreddit.eq(&item.subreddit)),
            )
            .set((
                subreddit_watch_items::subreddit.eq(&new_subreddit),
                subreddit_watch_items::channel_id.eq(&item.channel),
                subreddit_watch_items::updated_at.eq(datetime_to_string(&Utc::now())),
            ))
            .execute(&mut conn)?;

            if updated == 0 {
                return Err(DatabaseError::NotFound(format!(
                    "watch item /r/{} in guild {}",
                    item.subreddit, item.guild
                )));
            }
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn delete_watch_item(&self, item: &WatchItem) -> Result<(), DatabaseError> {
        let item = item.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            diesel::delete(
                subreddit_watch_items::table
                    .filter(subreddit_watch_items::guild_id.eq(&item.guild))
                    .filter(subreddit_watch_items::subreddit.eq(&item.subreddit)),
            )
            .execute(&mut conn)
            .map(|_| ())
            .map_err(DatabaseError::from)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteAuditStore {
    db_path: Arc<String>,
}

impl SqliteAuditStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::AuditStore for SqliteAuditStore {
    async fn insert_log_entry(&self, entry: &NewCpLogEntry) -> Result<(), DatabaseError> {
        let entry = entry.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let row = NewDbCpLogEntry {
                guild_id: &entry.guild_id,
                actor_id: &entry.actor_id,
                actor_name: &entry.actor_name,
                action: &entry.action,
                created_at: datetime_to_string(&Utc::now()),
            };

            diesel::insert_into(cp_log_entries::table)
                .values(&row)
                .execute(&mut conn)
                .map(|_| ())
                .map_err(DatabaseError::from)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn list_log_entries(
        &self,
        guild: &str,
        limit: i64,
    ) -> Result<Vec<CpLogEntry>, DatabaseError> {
        let guild = guild.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let rows = cp_log_entries::table
                .filter(cp_log_entries::guild_id.eq(&guild))
                .order(cp_log_entries::id.desc())
                .limit(limit)
                .select(DbCpLogEntry::as_select())
                .load::<DbCpLogEntry>(&mut conn)?;

            rows.iter().map(DbCpLogEntry::to_log_entry).collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
