//! Scanner state and timing constants

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::visitor::VisitorIdentity;

/// How long the welcome message stays up before the cooldown starts
pub const SUCCESS_DISPLAY: Duration = Duration::from_millis(5000);

/// Cooldown countdown interval
pub const COOLDOWN_TICK: Duration = Duration::from_millis(1000);

/// Countdown start value
pub const COOLDOWN_SECONDS: u32 = 10;

/// Shown when decoded text is not `<name>.<id>`
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid QR code format. Expected [Name].[id].";

/// State exposed to presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ScannerState {
    Idle,
    Scanning,
    Success {
        visitor: VisitorIdentity,
        timestamp: DateTime<Utc>,
    },
    Cooldown {
        remaining_seconds: u32,
    },
    Error {
        message: String,
    },
}

impl ScannerState {
    /// Success and cooldown suppress further decode results
    pub fn is_suppressed(&self) -> bool {
        matches!(self, ScannerState::Success { .. } | ScannerState::Cooldown { .. })
    }

    /// States in which a decode result is acted upon
    pub fn accepts_scans(&self) -> bool {
        matches!(self, ScannerState::Scanning | ScannerState::Error { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScannerState::Idle => "idle",
            ScannerState::Scanning => "scanning",
            ScannerState::Success { .. } => "success",
            ScannerState::Cooldown { .. } => "cooldown",
            ScannerState::Error { .. } => "error",
        }
    }
}
