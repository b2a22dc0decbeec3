use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "client_relay.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[clap(about = "Relays a WebSocket feed to stdout through a message transform", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "SENSE_URL", help = "WebSocket address of the upstream server.")]
    pub url: Option<String>,

    #[clap(long, env = "SENSE_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "SENSE_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "SENSE_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "SENSE_RETRY_DELAY_MS", help = "Milliseconds to wait before reconnecting after an error or close.")]
    pub retry_delay_ms: Option<u64>,

    #[clap(long, env = "SENSE_TRANSFORM", help = "Message transform (identity, upper, lower, trim).")]
    pub transform: Option<String>,

    #[clap(long, env = "SENSE_DEMAND", help = "How many messages the printer requests at a time.")]
    pub demand: Option<i64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            url: other.url.or(self.url),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            retry_delay_ms: other.retry_delay_ms.or(self.retry_delay_ms),
            transform: other.transform.or(self.transform),
            demand: other.demand.or(self.demand),
        }
    }

    fn defaults() -> Config {
        Config {
            url: Some("ws://localhost:8081/tweets/".to_string()),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            retry_delay_ms: Some(lib_sense::configs::DEFAULT_RETRY_DELAY_MS),
            transform: Some("identity".to_string()),
            demand: Some(100),
            ..Default::default()
        }
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    pub fn log_dir(&self) -> &Path {
        self.log_dir.as_deref().unwrap_or(Path::new("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn transform(&self) -> &str {
        self.transform.as_deref().unwrap_or("identity")
    }

    pub fn demand(&self) -> i64 {
        self.demand.unwrap_or(100)
    }

    /// The library-side view of this configuration.
    pub fn endpoint(&self) -> lib_sense::EndpointConfig {
        let mut endpoint = lib_sense::EndpointConfig::new(self.url());
        if let Some(delay) = self.retry_delay_ms {
            endpoint.retry_delay_ms = delay;
        }
        endpoint
    }
}

/// Defaults, then the config file, then environment and CLI.
pub fn load_config() -> Config {
    resolve(Config::parse())
}

fn resolve(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = Config::defaults();

    // Logging is not installed yet, so problems with the file go to stderr.
    if config_file_path.exists() {
        match fs::read_to_string(&config_file_path) {
            Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
                Ok(file_config) => current_config = current_config.merge(file_config),
                Err(e) => eprintln!(
                    "Failed to parse config file {}: {}. Falling back to other sources.",
                    config_file_path.display(),
                    e
                ),
            },
            Err(e) => eprintln!(
                "Failed to read config file {}: {}. Falling back to other sources.",
                config_file_path.display(),
                e
            ),
        }
    }

    current_config.merge(cli)
}
