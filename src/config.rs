pub use self::parser::{Config, DatabaseConfig, DbType, LimitsConfig, LoggingConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
