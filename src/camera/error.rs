//! Camera error types

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Classification of a failed stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CameraErrorKind {
    PermissionDenied,
    DeviceNotFound,
    UnknownError,
}

/// Camera error surfaced to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct CameraError {
    pub kind: CameraErrorKind,
    pub message: String,
}

impl CameraError {
    pub fn unsupported() -> Self {
        Self {
            kind: CameraErrorKind::DeviceNotFound,
            message: "Camera API is not supported".to_string(),
        }
    }

    pub fn permission_denied() -> Self {
        Self {
            kind: CameraErrorKind::PermissionDenied,
            message: "Camera access permission was denied".to_string(),
        }
    }

    pub fn device_not_found() -> Self {
        Self {
            kind: CameraErrorKind::DeviceNotFound,
            message: "No camera device was found".to_string(),
        }
    }

    pub fn unknown(message: &str) -> Self {
        let message = if message.trim().is_empty() {
            "An unknown camera error occurred".to_string()
        } else {
            message.to_string()
        };
        Self {
            kind: CameraErrorKind::UnknownError,
            message,
        }
    }
}

/// Raw fault reported by a camera platform
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformFault {
    /// The user or policy refused camera access
    #[error("Not allowed: {0}")]
    NotAllowed(String),
    /// No device satisfies the request
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

impl From<PlatformFault> for CameraError {
    fn from(fault: PlatformFault) -> Self {
        match fault {
            PlatformFault::NotAllowed(_) => CameraError::permission_denied(),
            PlatformFault::NotFound(_) => CameraError::device_not_found(),
            PlatformFault::Other(message) => CameraError::unknown(&message),
        }
    }
}

impl crate::core::error_handling::ContextualError for CameraError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self.kind,
            CameraErrorKind::PermissionDenied | CameraErrorKind::DeviceNotFound
        )
    }

    fn user_message(&self) -> Option<&str> {
        if self.is_user_actionable() {
            Some(&self.message)
        } else {
            None
        }
    }
}
