//! Configuration management for the nbpdf server

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::convert::BackendKind;

/// Default request body limit: 50MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default per-tool conversion timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub conversion: ConversionConfig,
    pub staging: StagingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// External toolchain settings, passed explicitly to the backends
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub backend: BackendKind,
    /// Extra directories searched for tools before the inherited `PATH`
    pub toolchain_path: Vec<PathBuf>,
    pub pandoc: String,
    pub pdf_engine: String,
    pub layout_engine: String,
    pub timeout_secs: u64,
}

impl ConversionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Parent directory of per-request scratch directories
    pub root: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            backend: BackendKind::Auto,
            toolchain_path: Vec::new(),
            pandoc: "pandoc".to_string(),
            pdf_engine: "xelatex".to_string(),
            layout_engine: "weasyprint".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        StagingConfig {
            root: env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&var, "SERVER_PORT")?.unwrap_or(defaults.server.port),
            },
            conversion: ConversionConfig {
                backend: match var("CONVERSION_BACKEND") {
                    Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                        var: "CONVERSION_BACKEND",
                        reason,
                    })?,
                    None => defaults.conversion.backend,
                },
                toolchain_path: var("TOOLCHAIN_PATH")
                    .map(|value| env::split_paths(&value).collect())
                    .unwrap_or_default(),
                pandoc: var("PANDOC_PATH").unwrap_or(defaults.conversion.pandoc),
                pdf_engine: var("PDF_ENGINE").unwrap_or(defaults.conversion.pdf_engine),
                layout_engine: var("LAYOUT_ENGINE").unwrap_or(defaults.conversion.layout_engine),
                timeout_secs: parse_var(&var, "CONVERSION_TIMEOUT_SECS")?
                    .unwrap_or(defaults.conversion.timeout_secs),
            },
            staging: StagingConfig {
                root: var("SCRATCH_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.staging.root),
                max_upload_bytes: parse_var(&var, "MAX_UPLOAD_BYTES")?
                    .unwrap_or(defaults.staging.max_upload_bytes),
            },
        })
    }
}

fn parse_var<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                var: key,
                reason: e.to_string(),
            })
        })
        .transpose()
}
