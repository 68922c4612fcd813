use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{AuditStore, DatabaseError, WatchStore};
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "postgres")]
use crate::db::postgres::{PostgresAuditStore, PostgresWatchStore};
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{SqliteAuditStore, SqliteWatchStore};
#[cfg(feature = "sqlite")]
use diesel::sqlite::SqliteConnection;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
use diesel::{Connection, RunQueryDsl};

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    watch_store: Arc<dyn WatchStore>,
    audit_store: Arc<dyn AuditStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

#[cfg(feature = "postgres")]
const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS subreddit_watch_items (
        id SERIAL PRIMARY KEY,
        guild_id TEXT NOT NULL,
        item_id INTEGER NOT NULL,
        subreddit TEXT NOT NULL,
        channel_id TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        UNIQUE (guild_id, subreddit),
        UNIQUE (guild_id, item_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cp_log_entries (
        id BIGSERIAL PRIMARY KEY,
        guild_id TEXT NOT NULL,
        actor_id TEXT NOT NULL,
        actor_name TEXT NOT NULL,
        action TEXT NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_watch_items_guild ON subreddit_watch_items(guild_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_watch_items_guild_subreddit_ci \
     ON subreddit_watch_items(guild_id, lower(subreddit))",
    "CREATE INDEX IF NOT EXISTS idx_cp_log_entries_guild ON cp_log_entries(guild_id)",
];

#[cfg(feature = "sqlite")]
const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS subreddit_watch_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        guild_id TEXT NOT NULL,
        item_id INTEGER NOT NULL,
        subreddit TEXT NOT NULL,
        channel_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE (guild_id, subreddit),
        UNIQUE (guild_id, item_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cp_log_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        guild_id TEXT NOT NULL,
        actor_id TEXT NOT NULL,
        actor_name TEXT NOT NULL,
        action TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_watch_items_guild ON subreddit_watch_items(guild_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_watch_items_guild_subreddit_ci \
     ON subreddit_watch_items(guild_id, lower(subreddit))",
    "CREATE INDEX IF NOT EXISTS idx_cp_log_entries_guild ON cp_log_entries(guild_id)",
];

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let manager = ConnectionManager::<PgConnection>::new(config.connection_string());

                let pool = r2d2::Pool::builder()
                    .max_size(config.max_connections().unwrap_or(10))
                    .min_idle(Some(config.min_connections().unwrap_or(1)))
                    .build(manager)
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                Ok(Self {
                    postgres_pool: Some(pool.clone()),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    watch_store: Arc::new(PostgresWatchStore::new(pool.clone())),
                    audit_store: Arc::new(PostgresAuditStore::new(pool)),
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path is not configured".to_string())
                })?;
                let path_arc = Arc::new(path.clone());

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    sqlite_path: Some(path),
                    watch_store: Arc::new(SqliteWatchStore::new(path_arc.clone())),
                    audit_store: Arc::new(SqliteAuditStore::new(path_arc)),
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        info!(db_type = ?self.db_type, "running database migrations");
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.clone().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool is not initialized".to_string())
                })?;
                Self::migrate_postgres(pool).await
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.clone().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path is not initialized".to_string())
                })?;
                Self::migrate_sqlite(path).await
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "postgres")]
    async fn migrate_postgres(pool: Pool) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            for statement in POSTGRES_SCHEMA {
                diesel::sql_query(*statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: String) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&path)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            for statement in SQLITE_SCHEMA {
                diesel::sql_query(*statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn watch_store(&self) -> Arc<dyn WatchStore> {
        self.watch_store.clone()
    }

    pub fn audit_store(&self) -> Arc<dyn AuditStore> {
        self.audit_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::{DatabaseError, NewCpLogEntry, NewWatchItem};

    async fn sqlite_manager(file: &NamedTempFile) -> DatabaseManager {
        let config = DatabaseConfig {
            url: None,
            conn_string: None,
            filename: Some(file.path().to_string_lossy().to_string()),
            max_connections: Some(1),
            min_connections: Some(1),
        };

        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");
        manager
    }

    fn new_item(guild: &str, subreddit: &str, channel: &str) -> NewWatchItem {
        NewWatchItem {
            guild: guild.to_string(),
            subreddit: subreddit.to_string(),
            channel: channel.to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_watch_item_lifecycle() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = sqlite_manager(&file).await;
        let store = manager.watch_store();

        let funny = store
            .create_watch_item(&new_item("guild-1", "funny", "c1"))
            .await
            .expect("create funny");
        let pics = store
            .create_watch_item(&new_item("guild-1", "pics", "c1"))
            .await
            .expect("create pics");
        let other_guild = store
            .create_watch_item(&new_item("guild-2", "funny", "c9"))
            .await
            .expect("create in other guild");

        assert_eq!(funny.id, 1);
        assert_eq!(pics.id, 2);
        assert_eq!(other_guild.id, 1);

        let mut moved = funny.clone();
        moved.channel = "c2".to_string();
        store.save_watch_item(&moved).await.expect("save channel");

        store
            .rename_watch_item(&pics, "gifs")
            .await
            .expect("rename pics");

        let items = store.list_watch_items("guild-1").await.expect("list");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].subreddit, "funny");
        assert_eq!(items[0].channel, "c2");
        assert_eq!(items[1].id, 2);
        assert_eq!(items[1].subreddit, "gifs");

        store.delete_watch_item(&items[0]).await.expect("delete funny");
        let items = store.list_watch_items("guild-1").await.expect("list after delete");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subreddit, "gifs");

        let next = store
            .create_watch_item(&new_item("guild-1", "aww", ""))
            .await
            .expect("create after delete");
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn sqlite_duplicate_subreddit_is_a_conflict() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = sqlite_manager(&file).await;
        let store = manager.watch_store();

        store
            .create_watch_item(&new_item("guild-1", "funny", "c1"))
            .await
            .expect("create funny");
        let err = store
            .create_watch_item(&new_item("guild-1", "funny", "c2"))
            .await
            .expect_err("duplicate subreddit must fail");

        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn sqlite_duplicate_subreddit_ignores_case() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = sqlite_manager(&file).await;
        let store = manager.watch_store();

        store
            .create_watch_item(&new_item("guild-1", "funny", "c1"))
            .await
            .expect("create funny");
        let err = store
            .create_watch_item(&new_item("guild-1", "FUNNY", "c1"))
            .await
            .expect_err("same subreddit in other case must fail");
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let items = store.list_watch_items("guild-1").await.expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subreddit, "funny");

        store
            .create_watch_item(&new_item("guild-2", "FUNNY", "c1"))
            .await
            .expect("other guild may watch the same subreddit");
    }

    #[tokio::test]
    async fn sqlite_rename_onto_watched_subreddit_is_a_conflict() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = sqlite_manager(&file).await;
        let store = manager.watch_store();

        store
            .create_watch_item(&new_item("guild-1", "funny", "c1"))
            .await
            .expect("create funny");
        let pics = store
            .create_watch_item(&new_item("guild-1", "Pics", "c1"))
            .await
            .expect("create pics");

        let err = store
            .rename_watch_item(&pics, "funny")
            .await
            .expect_err("rename onto watched subreddit must fail");
        assert!(matches!(err, DatabaseError::Conflict(_)));

        store
            .rename_watch_item(&pics, "pics")
            .await
            .expect("changing only the case of its own name is allowed");
        let items = store.list_watch_items("guild-1").await.expect("list");
        assert_eq!(items[1].subreddit, "pics");
    }

    #[tokio::test]
    async fn sqlite_rename_of_missing_item_fails() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = sqlite_manager(&file).await;
        let store = manager.watch_store();

        let ghost = crate::db::WatchItem {
            id: 7,
            subreddit: "ghost".to_string(),
            channel: String::new(),
            guild: "guild-1".to_string(),
        };
        let err = store
            .rename_watch_item(&ghost, "spooky")
            .await
            .expect_err("rename of missing row must fail");

        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn sqlite_audit_entries_are_listed_newest_first() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = sqlite_manager(&file).await;
        let audit = manager.audit_store();

        for action in ["Added reddit feed from /r/funny", "Removed feed from /r/funny"] {
            audit
                .insert_log_entry(&NewCpLogEntry {
                    guild_id: "guild-1".to_string(),
                    actor_id: "42".to_string(),
                    actor_name: "admin".to_string(),
                    action: action.to_string(),
                })
                .await
                .expect("insert log entry");
        }

        let entries = audit.list_log_entries("guild-1", 10).await.expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "Removed feed from /r/funny");
        assert!(audit.list_log_entries("guild-2", 10).await.expect("list").is_empty());
    }
}
