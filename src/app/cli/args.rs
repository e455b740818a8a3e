//! Command line arguments
//!
//! Holds the raw, unvalidated settings. Values given on the command line or
//! through the environment are already present after parsing; the config
//! file only fills what is still unset (see [`super::config`]).

use clap::builder::PossibleValuesParser;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::core::logging::LogFormat;

/// Where camera frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum CameraMode {
    /// Synthetic moving test pattern
    #[default]
    TestPattern,
    /// No camera capability at all
    None,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "visitor-kiosk")]
#[command(about = "Visitor check-in kiosk with QR code scanning")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Directory receiving visitor images and records
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Camera source
    #[arg(long = "camera", value_enum, value_name = "MODE")]
    pub camera: Option<CameraMode>,

    /// Requested frame width
    #[arg(long = "camera-width", value_name = "PIXELS")]
    pub camera_width: Option<u32>,

    /// Requested frame height
    #[arg(long = "camera-height", value_name = "PIXELS")]
    pub camera_height: Option<u32>,

    /// Requested frame rate
    #[arg(long = "camera-frame-rate", value_name = "FPS")]
    pub camera_frame_rate: Option<u32>,

    /// Color output control (unspecified = auto/TTY)
    #[arg(short = 'g', long = "color")]
    pub color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = PossibleValuesParser::new(LogFormat::names()))]
    pub log_format: Option<String>,

    /// Attendance database id
    #[arg(long = "notion-database-id", value_name = "ID", env = "NOTION_DATABASE_ID")]
    pub notion_database_id: Option<String>,

    /// Attendance API token
    #[arg(long = "notion-api-token", value_name = "TOKEN", env = "NOTION_API_TOKEN", hide_env_values = true)]
    pub notion_api_token: Option<String>,

    /// Attendance API base URL
    #[arg(long = "notion-api-url", value_name = "URL")]
    pub notion_api_url: Option<String>,

    /// Attempts per attendance request when the network fails (minimum: 1)
    #[arg(long = "notion-retry-attempts", value_name = "COUNT")]
    pub notion_retry_attempts: Option<usize>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from an explicit argument list (first item is the program name)
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Default config file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("VisitorKiosk").join("kiosk.toml"))
    }

    /// Default output directory for visitor files
    pub fn default_output_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("VisitorKiosk").join("visitors"))
            .unwrap_or_else(|| PathBuf::from("visitors"))
    }
}
