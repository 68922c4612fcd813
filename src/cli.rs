use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "reddit-watch-panel", version, about = "Control panel for per-guild subreddit feeds")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Overrides `logging.level` from the configuration file.
    #[arg(long, env = "REDDIT_PANEL_LOG_LEVEL")]
    pub log_level: Option<String>,
}
