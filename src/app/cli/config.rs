//! TOML configuration file loading and final settings resolution
//!
//! Values from the config file only fill settings the command line and
//! environment left unset, giving CLI > env > file > defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::args::{Args, CameraMode};
use crate::attendance::AttendanceConfig;
use crate::attendance::notion::DEFAULT_API_URL;
use crate::camera::CameraConstraints;
use crate::core::error_handling::ContextualError;
use crate::core::logging::LogFormat;
use crate::core::retry::RetryPolicy;

/// Frame size and rate the kiosk asks for unless configured otherwise
pub const KIOSK_CAMERA: CameraConstraints = CameraConstraints {
    width: Some(1280),
    height: Some(720),
    frame_rate: Some(30),
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("Error reading configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::MissingFile { .. } => Some("The specified configuration file does not exist"),
            ConfigError::Read { .. } => Some("The configuration file could not be read"),
            ConfigError::Parse { message, .. } => Some(message),
            ConfigError::InvalidValue { message, .. } => Some(message),
        }
    }
}

/// Fully resolved kiosk settings
#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub output_dir: PathBuf,
    pub camera: CameraMode,
    pub constraints: CameraConstraints,
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub attendance: AttendanceConfig,
}

impl Args {
    /// Load the config file (explicit or default location) into unset fields
    ///
    /// Returns the path that was applied, if any. A missing default file is
    /// not an error; a missing explicit one is.
    pub async fn load_config_file(&mut self) -> Result<Option<PathBuf>, ConfigError> {
        let path = match self.config_file.clone() {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingFile { path });
                }
                path
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config =
            toml::from_str::<toml::Table>(&contents).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        self.apply_toml_values(&config)?;
        log::debug!("Applied configuration file {}", path.display());
        Ok(Some(path))
    }

    /// Fill unset fields from a parsed config table
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> Result<(), ConfigError> {
        fill(&mut self.output_dir, string_value(config, "output-dir")?.map(PathBuf::from));
        fill(&mut self.camera, camera_value(config)?);
        fill(&mut self.camera_width, u32_value(config, "camera-width")?);
        fill(&mut self.camera_height, u32_value(config, "camera-height")?);
        fill(&mut self.camera_frame_rate, u32_value(config, "camera-frame-rate")?);
        fill(&mut self.color, bool_value(config, "color")?);
        fill(&mut self.log_level, string_value(config, "log-level")?);
        fill(&mut self.log_format, string_value(config, "log-format")?);
        fill(&mut self.log_file, string_value(config, "log-file")?.map(PathBuf::from));
        fill(&mut self.notion_database_id, string_value(config, "notion-database-id")?);
        fill(&mut self.notion_api_url, string_value(config, "notion-api-url")?);
        fill(
            &mut self.notion_retry_attempts,
            u32_value(config, "notion-retry-attempts")?.map(|n| n as usize),
        );
        if config.contains_key("notion-api-token") {
            log::warn!("Ignoring 'notion-api-token' in the configuration file; use NOTION_API_TOKEN");
        }
        Ok(())
    }

    /// Validate and apply defaults
    pub fn resolve(self) -> Result<KioskConfig, ConfigError> {
        let constraints = CameraConstraints {
            width: positive("camera-width", self.camera_width)?.or(KIOSK_CAMERA.width),
            height: positive("camera-height", self.camera_height)?.or(KIOSK_CAMERA.height),
            frame_rate: positive("camera-frame-rate", self.camera_frame_rate)?
                .or(KIOSK_CAMERA.frame_rate),
        };

        let retry = match self.notion_retry_attempts {
            Some(0) => {
                return Err(ConfigError::invalid(
                    "notion-retry-attempts",
                    "must be at least 1",
                ))
            }
            Some(1) => RetryPolicy::no_retry(),
            Some(max_attempts) => RetryPolicy {
                max_attempts,
                ..RetryPolicy::default()
            },
            None => RetryPolicy::default(),
        };

        let api_url = self
            .notion_api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(ConfigError::invalid(
                "notion-api-url",
                "must start with http:// or https://",
            ));
        }

        if let Some(level) = self.log_level.as_deref() {
            if !matches!(level, "trace" | "debug" | "info" | "warn" | "error" | "off") {
                return Err(ConfigError::invalid("log-level", format!("unknown level '{level}'")));
            }
        }
        if let Some(format) = self.log_format.as_deref() {
            if format.parse::<LogFormat>().is_err() {
                let known = LogFormat::names().collect::<Vec<_>>().join(", ");
                return Err(ConfigError::invalid(
                    "log-format",
                    format!("unknown format '{format}' (expected one of: {known})"),
                ));
            }
        }

        Ok(KioskConfig {
            output_dir: self.output_dir.unwrap_or_else(Args::default_output_dir),
            camera: self.camera.unwrap_or_default(),
            constraints,
            color: self.color,
            log_level: self.log_level,
            log_format: self.log_format,
            log_file: self.log_file.filter(|path| !is_disabled(path)),
            attendance: AttendanceConfig {
                database_id: self.notion_database_id,
                api_token: self.notion_api_token,
                api_url,
                timeout: Duration::from_secs(10),
                retry,
            },
        })
    }
}

fn fill<T>(target: &mut Option<T>, value: Option<T>) {
    if target.is_none() {
        *target = value;
    }
}

/// Magic values "none" and "-" disable file logging
fn is_disabled(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    raw.eq_ignore_ascii_case("none") || raw == "-"
}

fn positive(key: &str, value: Option<u32>) -> Result<Option<u32>, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::invalid(key, "must be greater than 0")),
        other => Ok(other),
    }
}

fn string_value(config: &toml::Table, key: &str) -> Result<Option<String>, ConfigError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ConfigError::invalid(key, "expected a string")),
    }
}

fn bool_value(config: &toml::Table, key: &str) -> Result<Option<bool>, ConfigError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(key, "expected true or false")),
    }
}

fn u32_value(config: &toml::Table, key: &str) -> Result<Option<u32>, ConfigError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(key, "expected a non-negative integer")),
    }
}

fn camera_value(config: &toml::Table) -> Result<Option<CameraMode>, ConfigError> {
    use clap::ValueEnum;

    match string_value(config, "camera")? {
        None => Ok(None),
        Some(mode) => CameraMode::from_str(&mode, true)
            .map(Some)
            .map_err(|_| ConfigError::invalid("camera", format!("unknown camera mode '{mode}'"))),
    }
}
