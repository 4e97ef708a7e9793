use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub control_plane: ControlPlaneConfig,
    pub metrics: MetricsConfig,
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub health_path: String,
    pub liveness_path: String,
    pub shutdown_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub url: String,
    pub activity_query: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub check_timeout_seconds: u64,
    pub run_timeout_seconds: u64,
    pub versions_path: PathBuf,
    pub seed_page_size: u32,
    pub worst_case_merge: bool,
    pub service_id: String,
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            control_plane: ControlPlaneConfig::default(),
            metrics: MetricsConfig::default(),
            database: DatabaseConfig::default(),
            dashboard: DashboardConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            health_path: "/health".to_string(),
            liveness_path: "/healthz".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            host: "crawler-controller".to_string(),
            port: 7700,
            api_key: String::new(),
            request_timeout_seconds: 5,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9090".to_string(),
            activity_query: "sum(rate(crawler_page_requests_total[5m]))".to_string(),
            request_timeout_seconds: 5,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./state.db".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            url: "http://crawler-dashboard:8080".to_string(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout_seconds: 3,
            run_timeout_seconds: 10,
            versions_path: PathBuf::from("./versions.json"),
            seed_page_size: 5,
            worst_case_merge: false,
            service_id: "crawl-health-api".to_string(),
            description: "aggregated health of the crawl platform".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("HEALTH")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if !self.server.health_path.starts_with('/') || !self.server.liveness_path.starts_with('/')
        {
            return Err(ConfigError::Message(
                "Endpoint paths must start with '/'".to_string(),
            ));
        }

        if self.server.health_path == self.server.liveness_path {
            return Err(ConfigError::Message(
                "Health and liveness paths must differ".to_string(),
            ));
        }

        if self.control_plane.host.is_empty() {
            return Err(ConfigError::Message(
                "Control plane host cannot be empty".to_string(),
            ));
        }

        if self.metrics.url.is_empty() || self.metrics.activity_query.is_empty() {
            return Err(ConfigError::Message(
                "Metrics URL and activity query cannot be empty".to_string(),
            ));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "Database URL cannot be empty".to_string(),
            ));
        }

        if self.dashboard.url.is_empty() {
            return Err(ConfigError::Message(
                "Dashboard URL cannot be empty".to_string(),
            ));
        }

        if self.health.check_timeout_seconds == 0 || self.health.run_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Health check timeouts must be greater than 0".to_string(),
            ));
        }

        if self.health.check_timeout_seconds > self.health.run_timeout_seconds {
            return Err(ConfigError::Message(
                "Per-check timeout cannot exceed the run timeout".to_string(),
            ));
        }

        if self.health.seed_page_size == 0 {
            return Err(ConfigError::Message(
                "Seed page size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
