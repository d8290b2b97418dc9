//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `DIALER__SECTION__KEY` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dialing: DialingConfig,
    pub monitor: MonitorConfig,
    pub telephony: TelephonyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost/predictive_dialer".to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 5,
        }
    }
}

/// Over-dial policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialingConfig {
    /// Calls placed per idle agent
    pub dialing_ratio: f64,
    /// Upper bound on calls placed by a single run
    pub max_concurrent_calls: usize,
    /// Seed for agent/caller-id selection; entropy when unset
    pub selection_seed: Option<u64>,
}

impl DialingConfig {
    /// `min(ceil(idle_agents * ratio), max_concurrent_calls)`
    pub fn calls_to_make(&self, idle_agents: usize) -> usize {
        let wanted = (idle_agents as f64 * self.dialing_ratio).ceil();
        let wanted = if wanted.is_finite() && wanted > 0.0 {
            wanted as usize
        } else {
            0
        };
        wanted.min(self.max_concurrent_calls)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.dialing_ratio.is_finite() || self.dialing_ratio <= 0.0 {
            return Err(format!("dialing_ratio must be positive, got {}", self.dialing_ratio));
        }
        if self.max_concurrent_calls == 0 {
            return Err("max_concurrent_calls must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Campaign monitor loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub error_backoff_secs: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Simulated telephony adapter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelephonyConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub weights: OutcomeWeights,
    pub seed: Option<u64>,
}

/// Relative likelihood of each simulated outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeWeights {
    pub answered: u32,
    pub busy: u32,
    pub no_answer: u32,
    pub failed: u32,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self {
            answered: 40,
            busy: 20,
            no_answer: 30,
            failed: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig::default(),
            dialing: DialingConfig::default(),
            monitor: MonitorConfig {
                interval_secs: 30,
                error_backoff_secs: 5,
            },
            telephony: TelephonyConfig {
                min_delay_ms: 2_000,
                max_delay_ms: 5_000,
                weights: OutcomeWeights::default(),
                seed: None,
            },
        }
    }
}

impl Default for DialingConfig {
    fn default() -> Self {
        Self {
            dialing_ratio: 1.5,
            max_concurrent_calls: 10,
            selection_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix("DIALER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config
            .dialing
            .validate()
            .map_err(config::ConfigError::Message)?;

        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
