//! Main entry point for the health API binary

use anyhow::Result;
use health_core::probes::{ControlPlaneOptions, MetricsOptions};
use health_core::{
    create_app, run_server, AppConfig, AppState, ControlPlaneClient, HealthChecker, MergePolicy,
    MetricsClient, ProbeSet, RegistryOptions, RelationalClient, ReportConfig, RunOptions,
    WebClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!(
        "Control plane: {}:{}",
        config.control_plane.host, config.control_plane.port
    );
    info!("Metrics backend: {}", config.metrics.url);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let control_plane = ControlPlaneClient::new(ControlPlaneOptions {
        host: config.control_plane.host.clone(),
        port: config.control_plane.port,
        api_key: config.control_plane.api_key.clone(),
        request_timeout: Duration::from_secs(config.control_plane.request_timeout_seconds),
    })
    .map_err(|e| anyhow::anyhow!("Failed to build control plane client: {}", e))?;

    let metrics = MetricsClient::new(MetricsOptions {
        url: config.metrics.url.clone(),
        activity_query: config.metrics.activity_query.clone(),
        request_timeout: Duration::from_secs(config.metrics.request_timeout_seconds),
    })
    .map_err(|e| anyhow::anyhow!("Failed to build metrics client: {}", e))?;

    let relational = RelationalClient::connect_lazy(
        &config.database.url,
        config.database.max_connections,
        Duration::from_secs(config.database.acquire_timeout_seconds),
    )
    .map_err(|e| anyhow::anyhow!("Failed to configure state database pool: {}", e))?;

    let web = WebClient::new(Duration::from_secs(config.control_plane.request_timeout_seconds))
        .map_err(|e| anyhow::anyhow!("Failed to build web client: {}", e))?;

    let probes = ProbeSet {
        control_plane: Arc::new(control_plane),
        metrics: Arc::new(metrics),
        relational: Arc::new(relational),
        web: Arc::new(web),
    };

    let health_checker = HealthChecker::standard(
        probes,
        RegistryOptions {
            versions_path: config.health.versions_path.clone(),
            dashboard_url: config.dashboard.url.clone(),
            seed_page_size: config.health.seed_page_size,
        },
        RunOptions {
            check_timeout: Duration::from_secs(config.health.check_timeout_seconds),
            run_timeout: Duration::from_secs(config.health.run_timeout_seconds),
        },
    );

    let merge_policy = if config.health.worst_case_merge {
        MergePolicy::WorstCase
    } else {
        MergePolicy::Optimistic
    };

    let state = AppState::new(
        health_checker,
        ReportConfig {
            release_id: env!("CARGO_PKG_VERSION").to_string(),
            service_id: config.health.service_id.clone(),
            description: config.health.description.clone(),
            merge_policy,
        },
    )?;

    info!("App: {} v{}", state.app_name, env!("CARGO_PKG_VERSION"));
    info!(
        "Health endpoint: {}, liveness endpoint: {}",
        config.server.health_path, config.server.liveness_path
    );

    let app = create_app(state, &config);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };

        format!(
            "{}={},health_core={},tower_http=debug",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer().with_target(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}
