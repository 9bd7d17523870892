use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "odds_gateway".into()
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set, e.g. "info" or "proxy=debug"
    pub level: Option<String>,
    pub sentry_dsn: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(flatten)]
    pub gateway: proxy::config::Config,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Loads `path` if given; without a file every setting takes its default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Config::default()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
