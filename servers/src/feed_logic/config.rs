use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Live comment feed server (mock producer)", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "FEED_PORT", help = "Port to listen on for client connections.")]
    pub port: Option<u16>,

    #[clap(long, env = "FEED_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "FEED_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "FEED_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "FEED_VIDEO_URL", help = "URL of the monitored video.")]
    pub video_url: Option<String>,

    #[clap(long, env = "FEED_SCRAPE_INTERVAL_SECONDS", help = "Seconds between comment batches.")]
    pub scrape_interval_seconds: Option<u64>,

    #[clap(long, env = "FEED_BATCH_SIZE", help = "Comments produced per batch.")]
    pub batch_size: Option<usize>,

    #[clap(long, env = "FEED_BROADCAST_NEWEST", help = "How many of each batch are broadcast as new_comments.")]
    pub broadcast_newest: Option<usize>,

    #[clap(long, env = "FEED_HISTORY_CAPACITY", help = "Comments kept for analytics.")]
    pub history_capacity: Option<usize>,

    #[clap(long, env = "FEED_SEED", help = "Fixed RNG seed for the mock comment source.")]
    pub seed: Option<u64>,

    #[clap(
        long,
        env = "FEED_ONCE",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Analyze the video once, log the report and exit instead of serving."
    )]
    pub once: Option<bool>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            video_url: other.video_url.or(self.video_url),
            scrape_interval_seconds: other.scrape_interval_seconds.or(self.scrape_interval_seconds),
            batch_size: other.batch_size.or(self.batch_size),
            broadcast_newest: other.broadcast_newest.or(self.broadcast_newest),
            history_capacity: other.history_capacity.or(self.history_capacity),
            seed: other.seed.or(self.seed),
            once: other.once.or(self.once),
        }
    }

    pub fn defaults() -> Config {
        Config {
            port: Some(8765),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            video_url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
            scrape_interval_seconds: Some(30),
            batch_size: Some(50),
            broadcast_newest: Some(5),
            history_capacity: Some(500),
            ..Default::default()
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8765)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_seconds.unwrap_or(30).max(1))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(50).max(1)
    }

    pub fn broadcast_newest(&self) -> usize {
        self.broadcast_newest.unwrap_or(5)
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity.unwrap_or(500).max(1)
    }

    pub fn once(&self) -> bool {
        self.once.unwrap_or(false)
    }
}

/// Defaults → config file → environment/CLI.
pub fn load_config() -> Config {
    load_config_with(Config::parse())
}

pub fn load_config_with(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("server_feed.conf"));

    let mut current_config = Config::defaults();
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }
    current_config.merge(cli)
}

fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
            Ok(file_config) => Some(file_config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}
