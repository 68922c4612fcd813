use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serenity::all::{ChannelType, GuildId, Http, UserId};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
    pub name: String,
    pub guild_id: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid discord id: {0}")]
    InvalidId(String),
    #[error("discord api error: {0}")]
    Api(String),
}

/// What the panel needs to know about a guild from Discord.
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// Channels a feed can be posted into.
    async fn guild_channels(&self, guild_id: &str) -> Result<Vec<DiscordChannel>, DirectoryError>;
    async fn is_member(&self, guild_id: &str, user_id: &str) -> Result<bool, DirectoryError>;
}

pub fn parse_snowflake(raw: &str) -> Result<u64, DirectoryError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(DirectoryError::InvalidId(raw.to_string())),
        Ok(value) => Ok(value),
    }
}

#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
        }
    }
}

#[async_trait]
impl GuildDirectory for DiscordClient {
    async fn guild_channels(&self, guild_id: &str) -> Result<Vec<DiscordChannel>, DirectoryError> {
        let guild = GuildId::new(parse_snowflake(guild_id)?);
        let channels = self.http.get_channels(guild).await.map_err(|e| {
            error!(guild_id = %guild, error = %e, "failed to fetch guild channels");
            DirectoryError::Api(e.to_string())
        })?;

        let postable: Vec<DiscordChannel> = channels
            .into_iter()
            .filter(|channel| matches!(channel.kind, ChannelType::Text | ChannelType::News))
            .map(|channel| DiscordChannel {
                id: channel.id.to_string(),
                name: channel.name,
                guild_id: guild_id.to_string(),
            })
            .collect();

        debug!(guild_id = %guild, count = postable.len(), "fetched guild channels");
        Ok(postable)
    }

    async fn is_member(&self, guild_id: &str, user_id: &str) -> Result<bool, DirectoryError> {
        let guild = GuildId::new(parse_snowflake(guild_id)?);
        let user = UserId::new(parse_snowflake(user_id)?);

        match self.http.get_member(guild, user).await {
            Ok(_) => Ok(true),
            Err(serenity::Error::Http(err))
                if err.status_code().map(|code| code.as_u16()) == Some(404) =>
            {
                Ok(false)
            }
            Err(e) => {
                error!(guild_id = %guild, user_id = %user, error = %e, "failed to fetch member");
                Err(DirectoryError::Api(e.to_string()))
            }
        }
    }
}
