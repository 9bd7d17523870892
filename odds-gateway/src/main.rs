mod config;
mod logging;

use clap::Parser;
use config::{Config, ConfigError};
use logging::LoggingError;
use shared::metrics::MetricsError;
use std::path::PathBuf;
use std::process::ExitCode;

/// HTTP gateway in front of the odds provider API.
#[derive(Parser, Debug)]
#[command(name = "odds-gateway", version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "ODDS_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Port for the API listener, overrides the config file
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Provider API key, overrides the config file
    #[arg(long, env = "ODDS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Proxy(#[from] proxy::ProxyError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "odds-gateway exited");
            eprintln!("odds-gateway: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StartupError> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.gateway.apply_overrides(cli.port, cli.api_key);

    let _sentry = logging::init(&config.common.logging)?;

    if let Some(metrics) = &config.common.metrics {
        shared::metrics::init_statsd(&metrics.statsd_host, metrics.statsd_port, &metrics.prefix)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(proxy::run(config.gateway))?;

    Ok(())
}
