//! HTTP API: routing, middleware and process bootstrap for both services.

pub mod app;
pub mod context;
pub mod middleware;

use anyhow::Context;
use tracing::info;

use meridian_infra::config::{AppConfig, ServiceKind};

/// Load configuration, initialise logging and serve until Ctrl-C.
pub async fn run(service: ServiceKind) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env(service).context("invalid configuration")?;
    let _log_guard = meridian_observability::init(&config.log_settings());

    let app = match service {
        ServiceKind::Users => app::build_users_app(&config),
        ServiceKind::Catalog => app::build_catalog_app(&config),
    };

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let local_addr = listener.local_addr()?;
    info!(
        service = %config.service_name,
        environment = config.environment.as_str(),
        addr = %local_addr,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(service = %config.service_name, "shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
