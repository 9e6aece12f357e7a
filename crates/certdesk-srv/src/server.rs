//! HTTP server runner: binds the listener and serves the API until Ctrl-C.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use certdesk_ca::CertificateService;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::routes;

/// Router with CORS and request tracing applied.
pub fn app(service: Arc<CertificateService>) -> Router {
    routes::router(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the API server and run until Ctrl-C.
pub async fn run(config: &ServerConfig) -> crate::Result<()> {
    run_until(config, shutdown_signal()).await
}

/// Start the API server and run until `shutdown` resolves.
pub async fn run_until(
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    let service = CertificateService::from_config(
        config.authority.clone(),
        config.actions.clone(),
        config.storage.clone(),
    )
    .await?;

    info!(
        certs_dir = %config.authority.certs_dir.display(),
        index_file = %config.authority.index_file.display(),
        audit_log = %config.storage.audit_log.display(),
        "certificate service ready"
    );

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| crate::SrvError::Server(format!("bind {}: {e}", config.listen)))?;
    info!(addr = %config.listen, "certdesk API listening");

    axum::serve(listener, app(Arc::new(service)))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::SrvError::Server(format!("server error: {e}")))?;

    info!("certdesk API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
