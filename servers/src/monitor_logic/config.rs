use clap::Parser;
use lib_pulse::{IngestConfig, IngestError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Headless consumer of the live comment feed", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "PULSE_ENDPOINT", help = "WebSocket address of the comment feed.")]
    pub endpoint: Option<String>,

    #[clap(long, env = "PULSE_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "PULSE_INGEST_CONFIG", help = "Path to a JSON ingestion config (camelCase IngestConfig).")]
    pub ingest_config_path: Option<PathBuf>,

    #[clap(long, env = "PULSE_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "PULSE_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "PULSE_REPORT_INTERVAL_SECONDS", help = "Minimum seconds between two summaries.")]
    pub report_interval_seconds: Option<u64>,

    #[clap(long, env = "PULSE_MAX_RECONNECT_ATTEMPTS", help = "Reconnect ceiling before switching to synthetic data.")]
    pub max_reconnect_attempts: Option<u32>,

    #[clap(long, env = "PULSE_BASE_BACKOFF_MS", help = "Backoff unit in milliseconds.")]
    pub base_backoff_ms: Option<u64>,

    #[clap(long, env = "PULSE_GENERATOR_INTERVAL_MS", help = "Synthetic comment period in milliseconds.")]
    pub generator_interval_ms: Option<u64>,

    #[clap(long, env = "PULSE_GENERATOR_SEED", help = "Fixed seed for the synthetic generator.")]
    pub generator_seed: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            endpoint: other.endpoint.or(self.endpoint),
            config_path: other.config_path.or(self.config_path),
            ingest_config_path: other.ingest_config_path.or(self.ingest_config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            report_interval_seconds: other.report_interval_seconds.or(self.report_interval_seconds),
            max_reconnect_attempts: other.max_reconnect_attempts.or(self.max_reconnect_attempts),
            base_backoff_ms: other.base_backoff_ms.or(self.base_backoff_ms),
            generator_interval_ms: other.generator_interval_ms.or(self.generator_interval_ms),
            generator_seed: other.generator_seed.or(self.generator_seed),
        }
    }

    pub fn defaults() -> Config {
        Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            report_interval_seconds: Some(10),
            ..Default::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_seconds.unwrap_or(10))
    }

    /// The ingestion settings: the JSON file if given (else defaults), then any field set here.
    pub fn ingest_config(&self) -> Result<IngestConfig, IngestError> {
        let mut ingest = match &self.ingest_config_path {
            Some(path) => IngestConfig::from_file(path)?,
            None => IngestConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            ingest.endpoint = endpoint.clone();
        }
        if let Some(v) = self.max_reconnect_attempts {
            ingest.max_reconnect_attempts = v;
        }
        if let Some(v) = self.base_backoff_ms {
            ingest.base_backoff_ms = v;
        }
        if let Some(v) = self.generator_interval_ms {
            ingest.generator_interval_ms = v;
        }
        if self.generator_seed.is_some() {
            ingest.generator_seed = self.generator_seed;
        }
        ingest.validate()?;
        Ok(ingest)
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
        .unwrap_or_else(|| PathBuf::from("pulse_monitor.conf"));

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
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<Config>(&s).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Failed to load config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}
