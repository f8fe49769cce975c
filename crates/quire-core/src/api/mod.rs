//! Remote page API
//!
//! The page store is a request/response service. The core only depends on
//! the [`PageApi`] contract; [`HttpPageApi`] is the production transport.
//!
//! ## Routes
//!
//! | Operation   | Request               | Response             |
//! |-------------|-----------------------|----------------------|
//! | List pages  | `GET /pages`          | `{ pages: Page[] }`  |
//! | Get page    | `GET /pages/{id}`     | `Page`               |
//! | Create page | `POST /pages`         | `Page`               |
//! | Update page | `PUT /pages/{id}`     | `Page`               |
//! | Delete page | `DELETE /pages/{id}`  | success/failure      |

mod http;

use async_trait::async_trait;

use crate::error::PageResult;
use crate::models::{HealthStatus, LogEntry, NewPage, Page, PageId, PageUpdate, ServerStatus};

pub use http::HttpPageApi;

/// Request/response contract of the remote page store
///
/// Timeouts and authentication are the implementation's concern.
#[async_trait]
pub trait PageApi: Send + Sync {
    /// Fetch every page, in the server's order
    async fn list_pages(&self) -> PageResult<Vec<Page>>;

    /// Fetch one page with its full content
    async fn get_page(&self, id: &PageId) -> PageResult<Page>;

    /// Create a page; the server assigns the id
    async fn create_page(&self, page: &NewPage) -> PageResult<Page>;

    /// Apply a partial update and return the confirmed page
    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> PageResult<Page>;

    /// Delete a page
    async fn delete_page(&self, id: &PageId) -> PageResult<()>;

    /// Liveness check
    async fn health(&self) -> PageResult<HealthStatus>;

    /// Server diagnostics (document counts, recent log)
    async fn server_status(&self) -> PageResult<ServerStatus>;

    /// Recent server operation log
    async fn logs(&self) -> PageResult<Vec<LogEntry>>;
}
