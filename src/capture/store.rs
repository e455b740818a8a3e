//! Visitor stores

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::PersistenceError;
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::visitor::VisitorIdentity;

/// Locator of the written file, or why it could not be written
pub type PersistenceOutcome = Result<PathBuf, PersistenceError>;

/// JSON shape of a visitor record file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord<'a> {
    pub visitor: &'a VisitorIdentity,
    pub timestamp: String,
    pub scanned_at: String,
}

impl<'a> VisitorRecord<'a> {
    pub fn new(visitor: &'a VisitorIdentity, timestamp: DateTime<Utc>, scanned_at: DateTime<Utc>) -> Self {
        Self {
            visitor,
            timestamp: iso8601(timestamp),
            scanned_at: iso8601(scanned_at),
        }
    }
}

/// Destination for snapshots and visitor records
#[async_trait]
pub trait VisitorStore: Send + Sync {
    async fn persist_image(&self, bytes: &[u8], filename: &str) -> PersistenceOutcome;

    /// Write the `{visitor, timestamp, scannedAt}` record for one scan
    async fn persist_record(
        &self,
        visitor: &VisitorIdentity,
        timestamp: DateTime<Utc>,
    ) -> PersistenceOutcome;
}

/// `visitor_<id>_<epochMillis>.jpg`
pub fn image_filename(visitor: &VisitorIdentity, timestamp: DateTime<Utc>) -> String {
    format!(
        "visitor_{}_{}.jpg",
        file_component(visitor.id()),
        timestamp.timestamp_millis()
    )
}

/// `visitor_<id>_<epochMillis>.json`
pub fn record_filename(visitor: &VisitorIdentity, timestamp: DateTime<Utc>) -> String {
    format!(
        "visitor_{}_{}.json",
        file_component(visitor.id()),
        timestamp.timestamp_millis()
    )
}

fn iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Ids come from printed badges; keep them from escaping the store directory.
fn file_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "__")
}

/// Store writing files into a local directory
pub struct LocalStore {
    directory: PathBuf,
    clock: Arc<dyn TimeProvider>,
}

impl LocalStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_clock(directory, Arc::new(SystemTimeProvider))
    }

    pub fn with_clock(directory: impl Into<PathBuf>, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            directory: directory.into(),
            clock,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    async fn write(&self, filename: &str, bytes: &[u8]) -> PersistenceOutcome {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| PersistenceError::StoreUnavailable {
                path: self.directory.clone(),
                source,
            })?;

        let path = self.directory.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;

        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[async_trait]
impl VisitorStore for LocalStore {
    async fn persist_image(&self, bytes: &[u8], filename: &str) -> PersistenceOutcome {
        self.write(&file_component(filename), bytes).await
    }

    async fn persist_record(
        &self,
        visitor: &VisitorIdentity,
        timestamp: DateTime<Utc>,
    ) -> PersistenceOutcome {
        let record = VisitorRecord::new(visitor, timestamp, self.clock.now_utc());
        let json = serde_json::to_vec_pretty(&record)?;
        self.write(&record_filename(visitor, timestamp), &json).await
    }
}
