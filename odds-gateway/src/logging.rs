use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("invalid sentry DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not install log subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When a Sentry DSN is
/// configured, error events are also reported to Sentry; the returned guard
/// flushes them on drop and must be held for the lifetime of the process.
pub fn init(config: &LoggingConfig) -> Result<Option<sentry::ClientInitGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_deref().unwrap_or("info")));

    let guard = match config.sentry_dsn.as_deref() {
        Some(dsn) => Some(sentry::init(sentry::ClientOptions {
            dsn: Some(dsn.parse()?),
            release: sentry::release_name!(),
            ..Default::default()
        })),
        None => None,
    };
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_layer)
        .try_init()?;

    Ok(guard)
}
