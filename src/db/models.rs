use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One subreddit feed posted into a guild channel.
///
/// `id` is only unique within the owning guild; the persisted row is
/// addressed by `guild` + `subreddit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchItem {
    pub id: i32,
    pub subreddit: String,
    pub channel: String,
    pub guild: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWatchItem {
    pub guild: String,
    pub subreddit: String,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpLogEntry {
    pub id: i64,
    pub guild_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCpLogEntry {
    pub guild_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub action: String,
}
