/*!
 * Kernel Configuration
 *
 * Sources, lowest to highest precedence:
 * 1. Built-in defaults from [`crate::core::limits`]
 * 2. JSON file named by `KERNEL_CONFIG`
 * 3. `KERNEL_TOTAL_MEMORY` / `KERNEL_MAX_PROCESSES` overrides
 */

use crate::core::limits::{DEFAULT_TOTAL_MEMORY, MAX_PROCESSES};
use crate::core::types::Size;
use crate::process::ProcessParams;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "KERNEL_CONFIG";
pub const ENV_TOTAL_MEMORY: &str = "KERNEL_TOTAL_MEMORY";
pub const ENV_MAX_PROCESSES: &str = "KERNEL_MAX_PROCESSES";

/// Configuration errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    #[diagnostic(code(config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    #[diagnostic(code(config::parse), help("The config file must be a JSON object."))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    #[diagnostic(code(config::env), help("Expected an unsigned integer."))]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(config::invalid))]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct KernelConfig {
    /// Virtual memory budget in bytes
    pub total_memory: Size,
    /// Cap on PIDs issued over the kernel's lifetime
    pub max_processes: u32,
    /// Parameters used when a start request omits them
    pub default_params: ProcessParams,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            total_memory: DEFAULT_TOTAL_MEMORY,
            max_processes: MAX_PROCESSES,
            default_params: ProcessParams::default(),
        }
    }
}

impl KernelConfig {
    /// Load configuration from the environment
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = match std::env::var_os(ENV_CONFIG_PATH) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(total) = env_number(ENV_TOTAL_MEMORY)? {
            config.total_memory = total;
        }
        if let Some(max) = env_number(ENV_MAX_PROCESSES)? {
            config.max_processes =
                u32::try_from(max).map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_MAX_PROCESSES,
                    value: max.to_string(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_total_memory(mut self, total: Size) -> Self {
        self.total_memory = total;
        self
    }

    pub fn with_max_processes(mut self, max: u32) -> Self {
        self.max_processes = max;
        self
    }

    pub fn with_default_params(mut self, params: ProcessParams) -> Self {
        self.default_params = params;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let params = &self.default_params;
        if params.initial_memory_size > params.max_memory_size {
            return Err(ConfigError::Invalid(format!(
                "default initial_memory_size {} exceeds max_memory_size {}",
                params.initial_memory_size, params.max_memory_size
            )));
        }
        Ok(())
    }
}

fn env_number(var: &'static str) -> ConfigResult<Option<usize>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}
