use queuedesk_core::EstimatorConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// How often the reminder worker rescans today's bookings.
    #[serde(default = "default_poll_seconds")]
    pub reminder_poll_seconds: u64,
}

fn default_enabled() -> bool { true }
fn default_poll_seconds() -> u64 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            reminder_poll_seconds: default_poll_seconds(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment specific overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // QUEUEDESK__SERVER__PORT=8080 sets server.port
            .add_source(config::Environment::with_prefix("QUEUEDESK").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config
            .estimator
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        if config.scheduler.reminder_poll_seconds == 0 {
            return Err(config::ConfigError::Message(
                "scheduler.reminder_poll_seconds must be positive".to_string(),
            ));
        }
        Ok(config)
    }
}
