//! Exporter server wiring and lifecycle.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use collector::CollectorTable;
use tokio::net::TcpListener;

use super::HEALTH_PATH;
use super::handlers::{AppState, handle_healthy, handle_landing, handle_metrics};
use super::middleware::ScrapeLogLayer;
use crate::config::ExporterConfig;
use crate::error::{Error, Result};
use crate::exposition::Exposition;

/// Builds the exporter's routes around a registered exposition.
///
/// The landing page is only mounted when the telemetry path is not `/`.
pub fn build_router(exposition: Arc<Exposition>, telemetry_path: &str) -> Router {
    let telemetry: Arc<str> = Arc::from(telemetry_path);
    let state = AppState {
        exposition,
        telemetry_path: telemetry.clone(),
    };

    let mut app = Router::new()
        .route(telemetry_path, get(handle_metrics))
        .route(HEALTH_PATH, get(handle_healthy));
    if telemetry_path != "/" {
        app = app.route("/", get(handle_landing));
    }

    app.layer(ScrapeLogLayer::new(telemetry)).with_state(state)
}

/// HTTP server exposing nsqd statistics to Prometheus.
pub struct ExporterServer {
    config: ExporterConfig,
    exposition: Arc<Exposition>,
}

impl ExporterServer {
    /// Builds the executor from `config` and registers it for exposition.
    pub fn new(config: ExporterConfig, table: &CollectorTable) -> Result<Self> {
        let executor = Arc::new(config.create_executor(table)?);
        let exposition = Arc::new(Exposition::register(executor)?);
        Ok(Self { config, exposition })
    }

    /// Binds the listen address and serves until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let app = build_router(self.exposition, &self.config.telemetry_path);

        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Io(format!("failed to bind {}: {}", addr, e)))?;
        tracing::info!(
            address = %addr,
            telemetry_path = %self.config.telemetry_path,
            "starting nsq exporter"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("nsq exporter stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
