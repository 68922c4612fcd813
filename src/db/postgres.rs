use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::Text;

use crate::db::manager::Pool;
use crate::db::schema::{cp_log_entries, subreddit_watch_items};

use super::{
    DatabaseError,
    models::{CpLogEntry, NewCpLogEntry, NewWatchItem, WatchItem},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subreddit_watch_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
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
    created_at: &'a DateTime<Utc>,
    updated_at: &'a DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cp_log_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct DbCpLogEntry {
    id: i64,
    guild_id: String,
    actor_id: String,
    actor_name: String,
    action: String,
    created_at: DateTime<Utc>,
}

impl From<DbCpLogEntry> for CpLogEntry {
    fn from(value: DbCpLogEntry) -> Self {
        Self {
            id: value.id,
            guild_id: value.guild_id,
            actor_id: value.actor_id,
            actor_name: value.actor_name,
            action: value.action,
            created_at: value.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = cp_log_entries)]
struct NewDbCpLogEntry<'a> {
    guild_id: &'a str,
    actor_id: &'a str,
    actor_name: &'a str,
    action: &'a str,
    created_at: &'a DateTime<Utc>,
}

fn checkout(pool: &Pool) -> Result<PooledConnection<ConnectionManager<PgConnection>>, DatabaseError> {
    pool.get()
        .map_err(|e| DatabaseError::Connection(e.to_string()))
}

pub struct PostgresWatchStore {
    pool: Pool,
}

impl PostgresWatchStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::WatchStore for PostgresWatchStore {
    async fn list_watch_items(&self, guild: &str) -> Result<Vec<WatchItem>, DatabaseError> {
        let guild = guild.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
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
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
            conn.transaction::<_, DatabaseError, _>(|conn| {
                // Serializes id assignment per guild until commit.
                diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                    .bind::<Text, _>(item.guild.clone())
                    .execute(conn)?;

                let highest: Option<i32> = subreddit_watch_items::table
                    .filter(subreddit_watch_items::guild_id.eq(&item.guild))
                    .select(max(subreddit_watch_items::item_id))
                    .get_result(conn)?;
                let next_id = highest.unwrap_or(0) + 1;

                let now = Utc::now();
                let row = NewDbWatchItem {
                    guild_id: &item.guild,
                    item_id: next_id,
                    subreddit: &item.subreddit,
                    channel_id: &item.channel,
                    created_at: &now,
                    updated_at: &now,
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
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
            let now = Utc::now();
            let row = NewDbWatchItem {
                guild_id: &item.guild,
                item_id: item.id,
                subreddit: &item.subreddit,
                channel_id: &item.channel,
                created_at: &now,
                updated_at: &now,
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
                    subreddit_watch_items::updated_at.eq(now),
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
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
            let updated = diesel::update(
                subreddit_watch_items::table
                    .filter(subreddit_watch_items::guild_id.eq(&item.guild))
                    .filter(subreddit_watch_items::subreddit.eq(&item.subreddit)),
            )
            .set((
                subreddit_watch_items::subreddit.eq(&new_subreddit),
                subreddit_watch_items::channel_id.eq(&item.channel),
                subreddit_watch_items::updated_at.eq(Utc::now()),
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
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
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

pub struct PostgresAuditStore {
    pool: Pool,
}

impl PostgresAuditStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::AuditStore for PostgresAuditStore {
    async fn insert_log_entry(&self, entry: &NewCpLogEntry) -> Result<(), DatabaseError> {
        let entry = entry.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
            let now = Utc::now();
            let row = NewDbCpLogEntry {
                guild_id: &entry.guild_id,
                actor_id: &entry.actor_id,
                actor_name: &entry.actor_name,
                action: &entry.action,
                created_at: &now,
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
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
            let rows = cp_log_entries::table
                .filter(cp_log_entries::guild_id.eq(&guild))
                .order(cp_log_entries::id.desc())
                .limit(limit)
                .select(DbCpLogEntry::as_select())
                .load::<DbCpLogEntry>(&mut conn)?;

            Ok(rows.into_iter().map(CpLogEntry::from).collect())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
