//! Planner configuration loaded from TOML.
//!
//! ```
//! use cflp_planner::infrastructure::PlannerConfig;
//! use std::time::Duration;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     backend = "highs"
//!     time_limit_secs = 30
//!     target_crs = "EPSG:32632"
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Duration::from_secs(30));
//! assert_eq!(config.id_field, "string_id");
//! ```

use crate::domain::value_objects::SolverBackend;
use crate::location::{DEFAULT_OPENING_COST, DEFAULT_TIME_LIMIT};
use crate::spatial::{Crs, DEFAULT_ID_FIELD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    pub backend: SolverBackend,
    pub time_limit_secs: f64,
    /// Cost charged per open facility
    pub fixed_opening_cost: f64,
    /// EPSG code distances are measured in
    pub target_crs: String,
    /// Feature property holding entity identifiers
    pub id_field: String,
    /// Where to save demand → facility assignments, if anywhere
    pub assignments_path: Option<PathBuf>,
    pub cost_matrix_path: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit_secs: DEFAULT_TIME_LIMIT.as_secs_f64(),
            fixed_opening_cost: DEFAULT_OPENING_COST,
            target_crs: Crs::utm_33n().to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            assignments_path: None,
            cost_matrix_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl PlannerConfig {
    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_limit_secs.is_finite() || self.time_limit_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_limit_secs must be a non-negative number, got {}",
                self.time_limit_secs
            )));
        }
        if !self.fixed_opening_cost.is_finite() || self.fixed_opening_cost < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_opening_cost must be a non-negative number, got {}",
                self.fixed_opening_cost
            )));
        }
        if self.id_field.trim().is_empty() {
            return Err(ConfigError::Invalid("id_field must not be empty".into()));
        }
        if self.target_crs.trim().is_empty() {
            return Err(ConfigError::Invalid("target_crs must not be empty".into()));
        }
        Ok(())
    }

    /// Solver time limit. Callers should have validated the config.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit_secs).unwrap_or(DEFAULT_TIME_LIMIT)
    }

    pub fn target_crs(&self) -> Crs {
        Crs::from_code(&self.target_crs)
    }

    /// Installs the tracing subscriber with `log_filter` (`RUST_LOG` still wins).
    pub fn init_tracing(&self) {
        super::telemetry::init_tracing(&self.log_filter);
    }
}
