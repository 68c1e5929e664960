use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Staleness timeout for advisory slot holds, in seconds.
    pub slot_hold_seconds: u64,
    /// Length of one bookable slot.
    pub slot_minutes: u32,
    /// Cancellations are refused closer to the start than this.
    pub cancellation_cutoff_hours: i64,
    #[serde(default = "default_peak_multiplier")]
    pub peak_multiplier: f64,
    #[serde(default = "default_peak_start")]
    pub peak_start_hour: u32,
    #[serde(default = "default_peak_end")]
    pub peak_end_hour: u32,
    /// Keep advisory holds in Redis instead of process memory, for
    /// deployments running more than one API instance.
    #[serde(default)]
    pub shared_locks: bool,
}

fn default_peak_multiplier() -> f64 {
    1.25
}

fn default_peak_start() -> u32 {
    17
}

fn default_peak_end() -> u32 {
    21
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base configuration, always present
            .add_source(config::File::with_name("config/default"))
            // Environment-specific overrides (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in (optional)
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables, e.g. PADUP__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("PADUP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
