use metrics_exporter_statsd::{StatsdBuilder, StatsdError};

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a global metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Installs a StatsD exporter as the global `metrics` recorder.
///
/// Until this is called every metric emitted through the `metrics` macros is discarded,
/// which is the behavior when no metrics backend is configured.
pub fn init_statsd(statsd_host: &str, statsd_port: u16, prefix: &str) -> Result<(), MetricsError> {
    let recorder = StatsdBuilder::from(statsd_host, statsd_port)
        .with_queue_size(5000)
        .with_buffer_size(1024)
        .build(Some(prefix))?;

    ::metrics::set_global_recorder(recorder).map_err(|_| MetricsError::RecorderAlreadySet)?;
    tracing::info!(host = statsd_host, port = statsd_port, "StatsD metrics enabled");
    Ok(())
}
