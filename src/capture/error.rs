//! Persistence error types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Failed to encode snapshot: {message}")]
    Encode { message: String },

    #[error("Failed to serialize visitor record: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store directory {} is unavailable: {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl crate::core::error_handling::ContextualError for PersistenceError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, PersistenceError::StoreUnavailable { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PersistenceError::StoreUnavailable { .. } => {
                Some("The output directory cannot be created or written")
            }
            _ => None,
        }
    }
}
