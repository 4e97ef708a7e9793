//! Core library for the crawl-platform health aggregation service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod probes;
pub mod report;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::create_routes;
pub use health::{
    CheckResult, Component, ComponentResult, HealthChecker, MergePolicy, ProbeSet,
    RegistryOptions, RunOptions, Status,
};
pub use probes::{ControlPlaneClient, MetricsClient, RelationalClient, WebClient};
pub use report::{Health, ReportCollector, ReportConfig};

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub health_checker: Arc<HealthChecker>,
    pub report: ReportConfig,
    pub liveness_body: Arc<String>,
}

impl AppState {
    pub fn new(health_checker: HealthChecker, report: ReportConfig) -> Result<Self> {
        // Encoded once; a failure here is a construction-time fault.
        let liveness_body = serde_json::to_string(&Health::up()).map_err(AppError::from)?;
        Ok(Self {
            app_name: "Crawl Health API".to_string(),
            health_checker: Arc::new(health_checker),
            report,
            liveness_body: Arc::new(liveness_body),
        })
    }
}

pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    create_routes(&config.server.health_path, &config.server.liveness_path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
