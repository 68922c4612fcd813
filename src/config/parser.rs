use super::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Prefix the host frontend serves the control panel under, used for `visible_url`.
    #[serde(default = "default_cp_prefix")]
    pub cp_prefix: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            cp_prefix: default_cp_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "empty_secret")]
    pub bot_token: SecretString,
    #[serde(default = "empty_secret")]
    pub access_token: SecretString,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub conn_string: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if url.starts_with("sqlite://") {
            DbType::Sqlite
        } else {
            DbType::Postgres
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref conn) = self.conn_string {
            conn.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }

    #[cfg(feature = "postgres")]
    pub fn max_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.max_connections,
            DbType::Sqlite => Some(1),
        }
    }

    #[cfg(feature = "postgres")]
    pub fn min_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.min_connections,
            DbType::Sqlite => Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_watch_items")]
    pub max_watch_items: usize,
    #[serde(default = "default_max_subreddit_length")]
    pub max_subreddit_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_watch_items: default_max_watch_items(),
            max_subreddit_length: default_max_subreddit_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_audit_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_audit_queue_capacity(),
            shutdown_timeout_secs: default_audit_shutdown_timeout(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.bot_token.expose_secret().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "auth.bot_token cannot be empty".to_string(),
            ));
        }

        if self.auth.access_token.expose_secret().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "auth.access_token cannot be empty".to_string(),
            ));
        }

        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if self.panel.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "panel.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.limits.max_watch_items == 0 || self.limits.max_subreddit_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "limits must be greater than zero".to_string(),
            ));
        }

        if self.audit.queue_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "audit.queue_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("REDDIT_PANEL_AUTH_BOT_TOKEN") {
            self.auth.bot_token = SecretString::from(value);
        }
        if let Ok(value) = std::env::var("REDDIT_PANEL_AUTH_ACCESS_TOKEN") {
            self.auth.access_token = SecretString::from(value);
        }
        if let Ok(value) = std::env::var("REDDIT_PANEL_DATABASE_URL") {
            self.database.url = Some(value);
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_cp_prefix() -> String {
    "/cp".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_watch_items() -> usize {
    25
}

fn default_max_subreddit_length() -> usize {
    100
}

fn default_audit_queue_capacity() -> usize {
    256
}

fn default_audit_shutdown_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::{Config, ConfigError, DbType};

    const MINIMAL: &str = r#"
auth:
  bot_token: "bot-token"
  access_token: "panel-secret"
database:
  filename: "/tmp/panel.db"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = Config::from_yaml(MINIMAL).expect("config parses");

        assert_eq!(config.panel.port, 8080);
        assert_eq!(config.panel.cp_prefix, "/cp");
        assert_eq!(config.limits.max_watch_items, 25);
        assert_eq!(config.limits.max_subreddit_length, 100);
        assert_eq!(config.audit.queue_capacity, 256);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auth.access_token.expose_secret(), "panel-secret");
    }

    #[test]
    fn sqlite_filename_resolves_to_sqlite_backend() {
        let config = Config::from_yaml(MINIMAL).expect("config parses");

        assert_eq!(config.database.db_type(), DbType::Sqlite);
        assert_eq!(config.database.sqlite_path().as_deref(), Some("/tmp/panel.db"));
        #[cfg(feature = "postgres")]
        assert_eq!(config.database.max_connections(), Some(1));
    }

    #[test]
    fn postgres_url_resolves_to_postgres_backend() {
        let yaml = r#"
auth:
  bot_token: "bot-token"
  access_token: "panel-secret"
database:
  url: "postgres://panel@localhost/panel"
  max_connections: 4
"#;
        let config = Config::from_yaml(yaml).expect("config parses");

        assert_eq!(config.database.db_type(), DbType::Postgres);
        assert_eq!(config.database.sqlite_path(), None);
        #[cfg(feature = "postgres")]
        assert_eq!(config.database.max_connections(), Some(4));
    }

    #[test]
    fn missing_database_is_rejected() {
        let yaml = r#"
auth:
  bot_token: "bot-token"
  access_token: "panel-secret"
database: {}
"#;
        let err = Config::from_yaml(yaml).expect_err("empty database must fail");
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn zero_item_limit_is_rejected() {
        let yaml = format!("{MINIMAL}limits:\n  max_watch_items: 0\n");
        let err = Config::from_yaml(&yaml).expect_err("zero limit must fail");
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }
}
