//! Layered service settings: defaults, optional TOML file, environment

use config::{Config, Environment, File};
use proctor::ProctorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::ApiError;

/// Default settings file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "smartsession.toml";

/// Environment variable overriding the settings file path
pub const CONFIG_PATH_VAR: &str = "SMARTSESSION_CONFIG";

/// Prefix for per-key overrides, e.g. `SMARTSESSION__SERVER__BIND_ADDR`
pub const ENV_PREFIX: &str = "SMARTSESSION";

/// Service settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub proctor: ProctorConfig,
    pub perception: PerceptionSettings,
    pub logging: LoggingSettings,
}

/// Listener and transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to bind
    pub bind_addr: String,
    /// Responses buffered per session before the reader waits on the writer
    pub outbound_queue: usize,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            outbound_queue: 32,
            metrics: true,
        }
    }
}

/// Answers of the built-in static oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionSettings {
    /// Faces reported for every frame
    pub face_count: usize,
    /// Report a neutral landmark mesh when exactly one face is present
    pub landmarks: bool,
}

impl Default for PerceptionSettings {
    fn default() -> Self {
        Self {
            face_count: 1,
            landmarks: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load from the process environment and the configured settings file
    pub fn load() -> Result<Self, ApiError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_with(Some(path), Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults, then `path` (if it exists), then `env`
    pub fn load_with(path: Option<PathBuf>, env: Environment) -> Result<Self, ApiError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            info!("Reading settings from {} (if present)", path.display());
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Settings = builder
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.proctor.validate()?;
        Ok(settings)
    }
}
