//! Attendance error types

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttendanceError {
    #[error("{setting} is not set")]
    NotConfigured { setting: &'static str },

    #[error("Invalid attendance configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Visitor {name} (ID: {id}) was not found in the attendance database")]
    VisitorNotFound { name: String, id: String },

    #[error("Attendance request failed: {message}")]
    Transport { message: String },

    #[error("Attendance API returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl AttendanceError {
    /// Connection-level failures that may succeed on another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            AttendanceError::Transport { .. } => true,
            AttendanceError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl crate::core::error_handling::ContextualError for AttendanceError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            AttendanceError::NotConfigured { .. } | AttendanceError::InvalidConfiguration { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AttendanceError::NotConfigured {
                setting: "NOTION_DATABASE_ID",
            } => Some("NOTION_DATABASE_ID is not set"),
            AttendanceError::NotConfigured { .. } => Some("NOTION_API_TOKEN is not set"),
            AttendanceError::InvalidConfiguration { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AttendanceError::Transport {
            message: "timed out".into()
        }
        .is_transient());
        assert!(AttendanceError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(!AttendanceError::Api {
            status: 401,
            message: "unauthorized".into()
        }
        .is_transient());
        assert!(!AttendanceError::VisitorNotFound {
            name: "Ada".into(),
            id: "42".into()
        }
        .is_transient());
    }

    #[test]
    fn test_messages_name_the_problem() {
        assert_eq!(
            AttendanceError::NotConfigured {
                setting: "NOTION_DATABASE_ID"
            }
            .to_string(),
            "NOTION_DATABASE_ID is not set"
        );
        assert_eq!(
            AttendanceError::VisitorNotFound {
                name: "田中太郎".into(),
                id: "12345".into()
            }
            .to_string(),
            "Visitor 田中太郎 (ID: 12345) was not found in the attendance database"
        );
    }
}
