pub mod config;
pub mod context;
pub mod errors;
pub mod forwarder;
pub mod metrics_defs;
mod proxy_service;
pub mod relay;
pub mod routes;

#[cfg(test)]
mod testutils;

pub use errors::ProxyError;
pub use proxy_service::ProxyService;

use shared::admin_service::AdminService;
use shared::http::run_http_service;

pub async fn run(config: config::Config) -> Result<(), ProxyError> {
    config.validate()?;

    let service = ProxyService::try_new(&config)?;
    tracing::info!(
        upstream = %config.upstream.base_url,
        routes = routes::ROUTES.len(),
        propagate_status = config.upstream.propagate_status,
        "Starting odds gateway"
    );

    let proxy_task = run_http_service(&config.listener.host, config.listener.port, service);

    match &config.admin_listener {
        Some(admin) => {
            let admin_task = run_http_service(
                &admin.host,
                admin.port,
                AdminService::<_, ProxyError>::new(|| true),
            );
            tokio::try_join!(proxy_task, admin_task)?;
        }
        None => proxy_task.await?,
    }

    Ok(())
}
