pub mod settings;

pub use settings::{
    AppConfig, ControlPlaneConfig, DashboardConfig, DatabaseConfig, HealthConfig, MetricsConfig,
    ServerConfig,
};
