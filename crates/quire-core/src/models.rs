//! Data models for Quire
//!
//! Defines the core data structures: Page, Block and the request bodies
//! sent to the remote page API. Blocks are opaque JSON owned by the editing
//! widget; the core only moves them around whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned page identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Create a page id from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An opaque unit of rich content
///
/// The internal shape (paragraph, heading, list item...) belongs to the
/// editor. Equality is structural JSON equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(serde_json::Value);

impl Block {
    /// Wrap a raw JSON value
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the raw JSON value
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Block {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A titled document made of content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Server-assigned identifier
    pub id: PageId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Optional icon shown next to the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Ordered content blocks
    #[serde(default, alias = "content")]
    pub blocks: Vec<Block>,
    /// When the server last confirmed a write; pages created without one
    /// are stamped at decode time
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl Page {
    /// Create a page with the given id and title and no content
    pub fn new(id: impl Into<PageId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            emoji: None,
            blocks: Vec::new(),
            last_modified: Utc::now(),
        }
    }

    /// Builder-style setter for the blocks
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub blocks: Vec<Block>,
}

/// Body of an update request
///
/// Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl PageUpdate {
    /// Update carrying new content, stamped with the current time
    pub fn content(blocks: Vec<Block>) -> Self {
        Self {
            title: None,
            blocks: Some(blocks),
            last_modified: Some(Utc::now()),
        }
    }

    /// Update carrying only a new title
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// List response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageList {
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// Result of the save state machine
///
/// One instance exists per editing session, not per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Last write succeeded (no timestamp before the first save)
    Saved { last_saved: Option<DateTime<Utc>> },
    /// A write is in flight
    Saving,
    /// Last write failed
    Error { message: String },
}

impl Default for SaveStatus {
    fn default() -> Self {
        SaveStatus::Saved { last_saved: None }
    }
}

impl SaveStatus {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveStatus::Saving)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SaveStatus::Error { .. })
    }
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStatus::Saved {
                last_saved: Some(at),
            } => write!(f, "saved at {}", at.format("%H:%M:%S")),
            SaveStatus::Saved { last_saved: None } => write!(f, "saved"),
            SaveStatus::Saving => write!(f, "saving..."),
            SaveStatus::Error { message } => write!(f, "save failed: {}", message),
        }
    }
}

// ==================== Diagnostics ====================

/// Response of the health endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A server-side operation log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub action: String,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Memory usage reported by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub heap_total: u64,
    pub heap_used: u64,
}

/// Per-document statistics reported by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStat {
    pub id: String,
    #[serde(default)]
    pub blocks_count: u64,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Response of the status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    #[serde(default)]
    pub documents_count: u64,
    #[serde(default)]
    pub logs_count: u64,
    #[serde(default)]
    pub uptime: f64,
    #[serde(default)]
    pub memory: MemoryUsage,
    #[serde(default)]
    pub last_logs: Vec<LogEntry>,
    #[serde(default)]
    pub documents: Vec<DocumentStat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_id_display() {
        let id = PageId::from("abc");
        assert_eq!(format!("{}", id), "abc");
        assert_eq!(id.as_str(), "abc");
        assert_eq!(id, PageId::new(String::from("abc")));
    }

    #[test]
    fn test_page_decodes_camel_case() {
        let page: Page = serde_json::from_value(json!({
            "id": "1",
            "title": "Alpha",
            "blocks": [{"type": "paragraph", "content": "hi"}],
            "lastModified": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(page.id, PageId::from("1"));
        assert_eq!(page.title, "Alpha");
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].as_value()["type"], "paragraph");
        assert!(page.emoji.is_none());
    }

    #[test]
    fn test_page_accepts_legacy_content_field() {
        let page: Page = serde_json::from_value(json!({
            "id": "2",
            "content": [{"type": "heading"}],
            "lastModified": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(page.title, "");
        assert_eq!(page.blocks, vec![Block::new(json!({"type": "heading"}))]);
    }

    #[test]
    fn test_page_missing_blocks_is_empty() {
        let page: Page = serde_json::from_value(json!({
            "id": "3",
            "title": "Empty",
            "lastModified": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert!(page.blocks.is_empty());
    }

    #[test]
    fn test_page_without_timestamp_is_stamped_on_decode() {
        let before = Utc::now();
        let page: Page =
            serde_json::from_str(r#"{"id":"3","title":"새 페이지","blocks":[]}"#).unwrap();

        assert_eq!(page.id, PageId::from("3"));
        assert_eq!(page.title, "새 페이지");
        assert!(page.blocks.is_empty());
        assert!(page.last_modified >= before);
    }

    #[test]
    fn test_page_update_skips_absent_fields() {
        let update = PageUpdate::title("Renamed");
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({"title": "Renamed"}));

        let update = PageUpdate::content(vec![Block::new(json!({"type": "paragraph"}))]);
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("title").is_none());
        assert!(value.get("lastModified").is_some());
        assert_eq!(value["blocks"], json!([{"type": "paragraph"}]));
    }

    #[test]
    fn test_save_status_default_is_saved_without_timestamp() {
        assert_eq!(
            SaveStatus::default(),
            SaveStatus::Saved { last_saved: None }
        );
        assert_eq!(SaveStatus::default().to_string(), "saved");
        assert!(SaveStatus::Saving.is_saving());
        assert!(SaveStatus::Error {
            message: "boom".into()
        }
        .is_error());
    }

    #[test]
    fn test_server_status_decodes() {
        let status: ServerStatus = serde_json::from_value(json!({
            "documentsCount": 2,
            "logsCount": 10,
            "uptime": 12.5,
            "memory": {"heapTotal": 2048, "heapUsed": 1024},
            "lastLogs": [{
                "timestamp": "2024-05-01T10:00:00Z",
                "action": "UPDATE",
                "documentId": "1",
                "details": "saved 3 blocks"
            }],
            "documents": [{"id": "1", "blocksCount": 3}]
        }))
        .unwrap();

        assert_eq!(status.documents_count, 2);
        assert_eq!(status.memory.heap_used, 1024);
        assert_eq!(status.last_logs[0].document_id, "1");
        assert_eq!(status.documents[0].blocks_count, 3);
    }
}
