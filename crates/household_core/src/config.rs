//! Gateway configuration resolution.
//!
//! # Responsibility
//! - Resolve the remote API base URL and request timeout.
//!
//! # Invariants
//! - Priority order: explicit argument, environment, TOML file, default.
//! - A missing config file is not an error; a malformed one is.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_BASE_URL: &str = "HOUSEHOLD_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "HOUSEHOLD_API_TIMEOUT_SECS";
pub const ENV_CONFIG_PATH: &str = "HOUSEHOLD_CONFIG";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    gateway: GatewaySection,
}

#[derive(Debug, Default, Deserialize)]
struct GatewaySection {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl GatewayConfig {
    /// Resolves configuration from the process environment.
    ///
    /// `base_url_arg` wins over every other source when set.
    pub fn resolve(base_url_arg: Option<&str>) -> Result<Self, ConfigError> {
        let file = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        Self::resolve_with(
            base_url_arg,
            |key| std::env::var(key).ok(),
            file.as_deref(),
        )
    }

    /// Resolves configuration from explicit sources.
    pub fn resolve_with(
        base_url_arg: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
        config_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_file {
            if let Some(section) = read_config_file(path)? {
                if let Some(base_url) = section.base_url {
                    config.base_url = base_url;
                }
                if let Some(timeout_secs) = section.timeout_secs {
                    config.timeout_secs = timeout_secs;
                }
            }
        }

        if let Some(base_url) = env(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url;
        }
        if let Some(raw) = env(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
        }

        if let Some(base_url) = base_url_arg {
            config.base_url = base_url.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                value: self.base_url.clone(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<Option<GatewaySection>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(parsed.gateway))
}
