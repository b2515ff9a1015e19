use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Root URL of the records API.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
}

impl DashboardConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("HERDBOOK_DASHBOARD_CONFIG")
            .unwrap_or_else(|_| "config/dashboard".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8501)?
            .set_default("api.base_url", "http://127.0.0.1:8000")?
            .set_default("api.timeout_secs", 15)?
            .add_source(File::with_name(&config_path).required(false))
            // e.g. HERDBOOK_DASHBOARD__API__BASE_URL
            .add_source(Environment::with_prefix("HERDBOOK_DASHBOARD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
