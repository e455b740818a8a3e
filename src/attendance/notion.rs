//! Notion REST client for the attendance database

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde_json::{json, Value};
use std::time::Duration;

use super::error::AttendanceError;
use super::updater::AttendanceStore;
use crate::visitor::VisitorIdentity;

pub const DEFAULT_API_URL: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Database query matching the visitor's `ID` (rich text) or `Name` (title)
pub fn attendance_query(visitor: &VisitorIdentity) -> Value {
    json!({
        "filter": {
            "or": [
                { "property": "ID", "rich_text": { "equals": visitor.id() } },
                { "property": "Name", "title": { "equals": visitor.name() } }
            ]
        }
    })
}

/// Page update setting the `Attended` checkbox
pub fn attended_update() -> Value {
    json!({ "properties": { "Attended": { "checkbox": true } } })
}

/// Id of the first page in a query response
pub fn first_page_id(response: &Value) -> Option<String> {
    response
        .get("results")?
        .as_array()?
        .first()?
        .get("id")?
        .as_str()
        .map(str::to_string)
}

/// Authenticated client for one Notion integration token
pub struct NotionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NotionClient {
    pub fn new(token: &str, base_url: &str, timeout: Duration) -> Result<Self, AttendanceError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| AttendanceError::InvalidConfiguration {
                message: format!("'{}' is not a usable Notion API URL", base_url),
            })?;

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(|_| {
            AttendanceError::InvalidConfiguration {
                message: "NOTION_API_TOKEN contains characters not allowed in a header".to_string(),
            }
        })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AttendanceError::InvalidConfiguration {
                message: e.to_string(),
            })?;

        Ok(Self { http, base_url })
    }

    /// API URL with each segment percent-encoded as a single path component
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AttendanceError> {
        if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(AttendanceError::InvalidConfiguration {
                message: format!("'{}' is not a valid Notion id", bad),
            });
        }
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, AttendanceError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            Ok(body)
        } else {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            Err(AttendanceError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn transport(error: reqwest::Error) -> AttendanceError {
    AttendanceError::Transport {
        message: error.to_string(),
    }
}

#[async_trait]
impl AttendanceStore for NotionClient {
    async fn find_first_match(
        &self,
        database_id: &str,
        visitor: &VisitorIdentity,
    ) -> Result<Option<String>, AttendanceError> {
        let url = self.endpoint(&["v1", "databases", database_id, "query"])?;
        let response = self
            .send(self.http.post(url).json(&attendance_query(visitor)))
            .await?;
        Ok(first_page_id(&response))
    }

    async fn mark_attended(&self, page_id: &str) -> Result<(), AttendanceError> {
        let url = self.endpoint(&["v1", "pages", page_id])?;
        self.send(self.http.patch(url).json(&attended_update()))
            .await
            .map(|_| ())
    }
}
