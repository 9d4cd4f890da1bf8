//! Configuration loading and validation.
//!
//! This module handles:
//! - Loading `dfdrift.json`
//! - Config resolution order (CLI > env > XDG > defaults)
//! - Schema version checking and semantic validation
//! - Content hashing so runs can record exactly which file they used

pub mod validation;

pub use validation::{validate_config, ValidationError};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::classify::{DEFAULT_ACTIVITY_KEY, DEFAULT_DELIMITER, DEFAULT_LIFECYCLE_KEY};
use crate::distribution::ApplyMode;
use dfdrift_common::DistributionKind;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DFDRIFT_CONFIG";

const CONFIG_DIR_NAME: &str = "dfdrift";
const CONFIG_FILE_NAME: &str = "dfdrift.json";

pub const DEFAULT_EPSILON: f64 = 0.01;
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl From<ConfigError> for dfdrift_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(_) | ConfigError::VersionMismatch { .. } => {
                dfdrift_common::Error::InvalidConfig(err.to_string())
            }
            _ => dfdrift_common::Error::Config(err.to_string()),
        }
    }
}

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_activity_key() -> String {
    DEFAULT_ACTIVITY_KEY.to_string()
}

fn default_lifecycle_key() -> String {
    DEFAULT_LIFECYCLE_KEY.to_string()
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Which attributes form an event label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_activity_key")]
    pub activity_key: String,
    #[serde(default = "default_lifecycle_key")]
    pub lifecycle_key: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            activity_key: default_activity_key(),
            lifecycle_key: default_lifecycle_key(),
            delimiter: default_delimiter(),
        }
    }
}

/// Drift detection settings, as stored in `dfdrift.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Distribution maintained over the trace stream.
    #[serde(default)]
    pub kind: DistributionKind,

    /// Drift fires when the relative-frequency shift norm exceeds this.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Significance level for reference comparisons.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    #[serde(default)]
    pub apply_mode: ApplyMode,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            kind: DistributionKind::default(),
            epsilon: DEFAULT_EPSILON,
            alpha: DEFAULT_ALPHA,
            apply_mode: ApplyMode::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Values given on the command line, applied over the loaded file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub kind: Option<DistributionKind>,
    pub epsilon: Option<f64>,
    pub alpha: Option<f64>,
    pub apply_mode: Option<ApplyMode>,
}

impl DriftConfig {
    /// Parse and validate config file content.
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: DriftConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        if config.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::VersionMismatch {
                expected: CONFIG_SCHEMA_VERSION.to_string(),
                actual: config.schema_version,
            });
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Apply CLI overrides and re-validate.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(kind) = overrides.kind {
            self.kind = kind;
        }
        if let Some(epsilon) = overrides.epsilon {
            self.epsilon = epsilon;
        }
        if let Some(alpha) = overrides.alpha {
            self.alpha = alpha;
        }
        if let Some(mode) = overrides.apply_mode {
            self.apply_mode = mode;
        }
        validate_config(&self)?;
        Ok(self)
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// `--config` flag.
    Cli,
    /// `DFDRIFT_CONFIG`.
    Env,
    /// `$XDG_CONFIG_HOME/dfdrift/dfdrift.json`.
    Xdg,
    /// Built-in defaults.
    Default,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config: DriftConfig,
    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the file content (None if using defaults).
    pub hash: Option<String>,
    pub source: ConfigSource,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI path (via ConfigOptions)
/// 2. Environment variable (DFDRIFT_CONFIG)
/// 3. XDG config home (~/.config/dfdrift/dfdrift.json)
/// 4. Built-in defaults
///
/// An explicit path from 1 or 2 must exist; the XDG file is optional.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let env_path = std::env::var_os(CONFIG_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    resolve_config(options, env_path, xdg_config_home())
}

fn xdg_config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
}

fn resolve_config(
    options: &ConfigOptions,
    env_path: Option<PathBuf>,
    xdg_home: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let explicit = options
        .config_path
        .clone()
        .map(|p| (p, ConfigSource::Cli))
        .or_else(|| env_path.map(|p| (p, ConfigSource::Env)));

    if let Some((path, source)) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return load_from_file(path, source);
    }

    if let Some(home) = xdg_home {
        let path = home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if path.exists() {
            return load_from_file(path, ConfigSource::Xdg);
        }
    }

    Ok(ResolvedConfig {
        config: DriftConfig::default(),
        path: None,
        hash: None,
        source: ConfigSource::Default,
    })
}

fn load_from_file(path: PathBuf, source: ConfigSource) -> Result<ResolvedConfig, ConfigError> {
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        source: e,
    })?;
    let hash = compute_hash(&content);
    let config = DriftConfig::from_json_str(&content, &path)?;
    Ok(ResolvedConfig {
        config,
        path: Some(path),
        hash: Some(hash),
        source,
    })
}

/// SHA-256 of the file content, hex encoded.
fn compute_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
