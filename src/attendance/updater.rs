//! Attendance update orchestration

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::error::AttendanceError;
use super::notion::{NotionClient, DEFAULT_API_URL};
use crate::core::retry::{retry_async, RetryPolicy};
use crate::visitor::VisitorIdentity;

/// Marks visitors as attended; consumed by the scan lifecycle
#[async_trait]
pub trait AttendanceService: Send + Sync {
    async fn update_attendance(&self, visitor: &VisitorIdentity) -> Result<(), AttendanceError>;
}

/// Remote record store operations
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Page id of the first record whose id or name matches
    async fn find_first_match(
        &self,
        database_id: &str,
        visitor: &VisitorIdentity,
    ) -> Result<Option<String>, AttendanceError>;

    async fn mark_attended(&self, page_id: &str) -> Result<(), AttendanceError>;
}

/// Settings for the remote attendance database
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    pub database_id: Option<String>,
    pub api_token: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            database_id: None,
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Looks up the visitor and flips `Attended` on the first match
///
/// Missing configuration is not an error at construction time; it is
/// reported by every [`AttendanceService::update_attendance`] call instead so
/// the kiosk keeps greeting visitors without a remote database.
pub struct AttendanceUpdater {
    database_id: Option<String>,
    store: Result<Arc<dyn AttendanceStore>, AttendanceError>,
    retry: RetryPolicy,
}

impl AttendanceUpdater {
    pub fn from_config(config: &AttendanceConfig) -> Self {
        let store = match non_blank(config.api_token.as_deref()) {
            Some(token) => NotionClient::new(token, &config.api_url, config.timeout)
                .map(|client| Arc::new(client) as Arc<dyn AttendanceStore>),
            None => Err(AttendanceError::NotConfigured {
                setting: "NOTION_API_TOKEN",
            }),
        };

        Self {
            database_id: config.database_id.clone(),
            store,
            retry: config.retry.clone(),
        }
    }

    pub fn with_store(
        database_id: Option<String>,
        store: Arc<dyn AttendanceStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            database_id,
            store: Ok(store),
            retry,
        }
    }

    /// Configuration problem that will make every update fail, if any
    pub fn configuration_error(&self) -> Option<AttendanceError> {
        if non_blank(self.database_id.as_deref()).is_none() {
            return Some(AttendanceError::NotConfigured {
                setting: "NOTION_DATABASE_ID",
            });
        }
        self.store.as_ref().err().cloned()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl AttendanceService for AttendanceUpdater {
    async fn update_attendance(&self, visitor: &VisitorIdentity) -> Result<(), AttendanceError> {
        let database_id = non_blank(self.database_id.as_deref()).ok_or(
            AttendanceError::NotConfigured {
                setting: "NOTION_DATABASE_ID",
            },
        )?;
        let store: &dyn AttendanceStore = self.store.as_ref().map_err(Clone::clone)?.as_ref();

        let page_id = retry_async(
            "attendance lookup",
            self.retry.clone(),
            AttendanceError::is_transient,
            move || store.find_first_match(database_id, visitor),
        )
        .await?
        .ok_or_else(|| AttendanceError::VisitorNotFound {
            name: visitor.name().to_string(),
            id: visitor.id().to_string(),
        })?;

        let page = page_id.as_str();
        retry_async(
            "attendance update",
            self.retry.clone(),
            AttendanceError::is_transient,
            move || store.mark_attended(page),
        )
        .await?;

        log::info!("Marked {} as attended (page {})", visitor, page_id);
        Ok(())
    }
}
