//! Server configuration loaded with the `config` crate

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// HTTP server and background task settings
///
/// # Environment Variables
/// - `APP_HOST` (default: "0.0.0.0")
/// - `APP_PORT` (default: 3000)
/// - `APP_BROADCAST_QUEUE_CAPACITY`: per-client frame queue (default: 16)
/// - `APP_SWEEP_SCHEDULE`: cron schedule of the expiry sweep (default: every 30 seconds)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub broadcast_queue_capacity: usize,
    pub sweep_schedule: String,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000_i64)?
            .set_default("broadcast_queue_capacity", 16_i64)?
            .set_default("sweep_schedule", "0/30 * * * * *")?
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
