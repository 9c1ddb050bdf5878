//! Runtime configuration for the clinker planning service.
//!
//! A single `Config` struct, loaded once at binary startup and threaded
//! explicitly into every component constructor — no global singletons,
//! no `OnceCell<Config>`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid environment override for {field}: {value}")]
    InvalidEnvOverride { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverChoice {
    Auto,
    Commercial,
    ModernOpen,
    LegacyOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFullPolicy {
    Block,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Below this, a production cost value emits a warning, not an error.
    pub min_production_cost_per_tonne: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self { min_production_cost_per_tonne: 100.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRates {
    /// Per-tonne penalty applied to the opt-in soft-demand slack variable.
    pub unmet_demand_per_tonne: f64,
}

impl Default for PenaltyRates {
    fn default() -> Self {
        Self { unmet_demand_per_tonne: 10_000.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub default_solver: SolverChoice,
    pub solver_time_limit_seconds: f64,
    pub solver_mip_gap: f64,
    pub routing_primary_provider: Option<String>,
    pub routing_secondary_provider: Option<String>,
    pub routing_timeout_seconds: u64,
    pub routing_max_retries: u32,
    pub worker_pool_size: usize,
    pub job_queue_capacity: usize,
    pub queue_full_policy: QueueFullPolicy,
    pub batch_retention_days: u32,
    pub log_level: String,
    pub log_format: String,
    pub validation_thresholds: ValidationThresholds,
    pub penalty_rates: PenaltyRates,
    pub audit_log_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://clinker.db".to_string(),
            default_solver: SolverChoice::Auto,
            solver_time_limit_seconds: 600.0,
            solver_mip_gap: 0.01,
            routing_primary_provider: None,
            routing_secondary_provider: None,
            routing_timeout_seconds: 10,
            routing_max_retries: 3,
            worker_pool_size: 4,
            job_queue_capacity: 64,
            queue_full_policy: QueueFullPolicy::Block,
            batch_retention_days: 30,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            validation_thresholds: ValidationThresholds::default(),
            penalty_rates: PenaltyRates::default(),
            audit_log_enabled: true,
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults for absent fields.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load from `path` if it exists, else start from defaults; then
    /// apply `CLINKER_*` environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var("CLINKER_DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = std::env::var("CLINKER_WORKER_POOL_SIZE") {
            self.worker_pool_size = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                field: "CLINKER_WORKER_POOL_SIZE",
                value: value.clone(),
            })?;
        }
        if let Ok(value) = std::env::var("CLINKER_LOG_LEVEL") {
            self.log_level = value;
        }
        Ok(())
    }

    /// Default location: `~/.clinker/config.toml`, mirroring
    /// `clinker-logging`'s home-directory convention.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".clinker").join("config.toml"))
    }
}
