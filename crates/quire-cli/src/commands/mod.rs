//! Command handlers

pub mod config;
pub mod logs;
pub mod page;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};

use quire_core::{Config, DocumentBuffer, HttpPageApi, PageApi, PageController};

/// A controller bound to the configured server and an in-memory editor
pub struct Session {
    pub controller: PageController,
    pub editor: Arc<DocumentBuffer>,
}

impl Session {
    /// Connect to the server and load the page list
    pub async fn open(config: &Config) -> Result<Self> {
        let api: Arc<dyn PageApi> = Arc::new(connect(config)?);
        let editor = Arc::new(DocumentBuffer::new());
        let controller = PageController::new(api, editor.clone(), config);

        if let quire_core::LoadOutcome::Failed(e) = controller.load_pages().await {
            return Err(e).context(format!("Could not load pages from {}", config.api_url));
        }

        Ok(Self { controller, editor })
    }
}

/// Build the HTTP client for the configured server
pub fn connect(config: &Config) -> Result<HttpPageApi> {
    HttpPageApi::from_config(config)
        .with_context(|| format!("Invalid API URL: {}", config.api_url))
}
