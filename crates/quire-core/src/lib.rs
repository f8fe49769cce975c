//! Quire Core Library
//!
//! This crate keeps a multi-page block editor in step with a remote page
//! store: it caches the page list, tracks which page is open, and saves
//! edits in the background without ever writing one page's content to
//! another.
//!
//! # Architecture
//!
//! - **Controller**: page lifecycle (load, select, create, rename, delete)
//! - **Save engine**: debounced background writes with a session save status
//! - **Page API**: request/response contract with an HTTP implementation
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let api = Arc::new(HttpPageApi::from_config(&config)?);
//! let editor = Arc::new(DocumentBuffer::new());
//! let controller = PageController::new(api, editor.clone(), &config);
//!
//! controller.load_pages().await;
//! editor.apply_edit(blocks);          // saved after the quiet period
//! controller.shutdown().await;        // flushes anything pending
//! ```
//!
//! # Modules
//!
//! - `controller`: page lifecycle (main entry point)
//! - `directory`: cached page list and current selection
//! - `adapter`: editor widget contract and an in-memory document
//! - `sync`: debounced save engine
//! - `api`: remote page store contract and HTTP client
//! - `models`: pages, blocks, save status and server diagnostics
//! - `config`: application configuration

pub mod adapter;
pub mod api;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod models;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{ChangeCallback, DocumentBuffer, EditorAdapter, Subscription};
pub use api::{HttpPageApi, PageApi};
pub use config::{Config, DEFAULT_PAGE_TITLE};
pub use controller::{LoadOutcome, PageController, SelectOutcome};
pub use directory::PageDirectory;
pub use error::{PageError, PageResult};
pub use models::{Block, NewPage, Page, PageId, PageUpdate, SaveStatus};
pub use sync::{SaveEvent, SaveHandle};
