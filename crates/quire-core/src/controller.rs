//! Page lifecycle controller
//!
//! Orchestrates load-all, select, create, rename and delete against the
//! directory, the editor adapter and the remote API, and owns the save task.
//!
//! ## Consistency
//!
//! The directory's selection and the editor document are only ever changed
//! together, inside one critical section that runs after the request that
//! caused the change has completed. No lock is held across a request.
//!
//! Responses can arrive out of order. Every operation that changes the
//! selection takes a ticket when it starts; a response whose ticket is no
//! longer the latest is discarded instead of applied. Full loads use their
//! own sequence number with the same last-issued-wins rule.
//!
//! ## Transitions
//!
//! | Operation            | Success                                            | Failure                     |
//! |----------------------|----------------------------------------------------|-----------------------------|
//! | `load_pages`         | replace list; select first if nothing valid is open | logged, state unchanged     |
//! | `select_page(p)`     | cache fresh `p`, select it, show its blocks         | error returned, no change   |
//! | `create_page`        | append, select it, show server content              | error returned, no change   |
//! | `delete_page(p)` (current, others left) | select first remaining (cached, then fresh) | error returned, no change |
//! | `delete_page(p)` (current, last)        | clear selection, show empty document         | error returned, no change |
//! | `rename_page(p, t)`  | cache confirmed page; editor untouched              | error returned, no change   |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::adapter::{EditorAdapter, Subscription};
use crate::api::PageApi;
use crate::config::Config;
use crate::directory::PageDirectory;
use crate::error::{PageError, PageResult};
use crate::models::{Block, NewPage, Page, PageId, PageUpdate, SaveStatus};
use crate::sync::{spawn_save_task, SaveCommand, SaveEvent, SaveHandle};

/// Result of a full page load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Directory replaced with this many pages
    Loaded(usize),
    /// A later load was issued; this response was dropped
    Superseded,
    /// Request failed; directory left as it was
    Failed(PageError),
}

/// Result of a selection request
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// Page is now current and shown in the editor
    Selected(Page),
    /// A later selection won, or the page left the directory meanwhile
    Discarded,
}

/// Keeps the loading flag raised while a request is in flight
struct LoadingGuard<'a> {
    loading: &'a watch::Sender<usize>,
}

impl<'a> LoadingGuard<'a> {
    fn new(loading: &'a watch::Sender<usize>) -> Self {
        loading.send_modify(|n| *n += 1);
        Self { loading }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Owns the page directory, the editor binding and the save task
pub struct PageController {
    api: Arc<dyn PageApi>,
    adapter: Arc<dyn EditorAdapter>,
    directory: Arc<Mutex<PageDirectory>>,
    saver: SaveHandle,
    default_title: String,
    /// Latest selection ticket
    selection_ticket: AtomicU64,
    /// Latest full-load sequence number
    load_seq: AtomicU64,
    /// Requests in flight that the UI shows a loading state for
    loading: watch::Sender<usize>,
    subscription: Subscription,
}

impl PageController {
    /// Create a controller and start its save task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(api: Arc<dyn PageApi>, adapter: Arc<dyn EditorAdapter>, config: &Config) -> Self {
        let directory = Arc::new(Mutex::new(PageDirectory::new()));
        let saver = spawn_save_task(
            config.save_debounce(),
            Arc::clone(&api),
            Arc::clone(&adapter),
            Arc::clone(&directory),
        );

        let selection = directory.lock().subscribe_selection();
        let subscription = bind_editor(&adapter, selection, saver.command_sender());
        let (loading, _) = watch::channel(0);

        Self {
            api,
            adapter,
            directory,
            saver,
            default_title: config.default_title.clone(),
            selection_ticket: AtomicU64::new(0),
            load_seq: AtomicU64::new(0),
            loading,
            subscription,
        }
    }

    // ==================== Queries ====================

    /// Snapshot of the cached pages, in load order
    pub fn pages(&self) -> Vec<Page> {
        self.directory.lock().pages().to_vec()
    }

    pub fn current_page_id(&self) -> Option<PageId> {
        self.directory.lock().current_page_id()
    }

    /// Cached copy of the current page
    pub fn current_page(&self) -> Option<Page> {
        self.directory.lock().current_page().cloned()
    }

    /// Document currently shown in the editor
    pub fn document(&self) -> Vec<Block> {
        self.adapter.get_document()
    }

    /// True while a load or select request is in flight
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow() > 0
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saver.status()
    }

    /// Take the save event receiver (can only be called once)
    pub fn take_save_events(&mut self) -> Option<mpsc::UnboundedReceiver<SaveEvent>> {
        self.saver.take_events()
    }

    // ==================== Operations ====================

    /// Fetch every page and replace the directory
    ///
    /// Best effort: failures are logged and reported in the outcome, never
    /// applied. If nothing valid is open afterwards, the first page becomes
    /// current. A reload never changes what the editor shows for a page
    /// that stays open.
    pub async fn load_pages(&self) -> LoadOutcome {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::new(&self.loading);
        info!("Loading pages");

        let pages = match self.api.list_pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Failed to load pages: {}", e);
                return LoadOutcome::Failed(e);
            }
        };

        if self.load_seq.load(Ordering::SeqCst) != seq {
            debug!("Discarding superseded page list");
            return LoadOutcome::Superseded;
        }

        let count = pages.len();
        let mut directory = self.directory.lock();
        let open = directory.current_page().cloned();
        directory.set_pages(pages);

        match open {
            Some(open) if directory.contains(&open.id) => {
                // Keep the full copy the editor was loaded from
                directory.replace(open);
            }
            _ => match directory.first().cloned() {
                Some(first) => {
                    debug!("Opening first page {}", first.id);
                    directory.select(Some(first.id));
                    self.adapter.replace_document(first.blocks);
                }
                None => {
                    if directory.current_page_id().is_some() {
                        directory.select(None);
                        self.adapter.replace_document(Vec::new());
                    }
                }
            },
        }

        info!("Loaded {} page(s)", count);
        LoadOutcome::Loaded(count)
    }

    /// Fetch a page fresh from the server and open it
    ///
    /// Selecting the page that is already open refetches and reapplies it.
    pub async fn select_page(&self, id: &PageId) -> PageResult<SelectOutcome> {
        let ticket = self.next_ticket();
        self.fetch_and_open(id, ticket).await
    }

    /// Create a page seeded with the editor's current document and open it
    pub async fn create_page(&self) -> PageResult<Page> {
        let title = self.default_title.clone();
        self.create_page_with_title(&title).await
    }

    /// Like `create_page`, with the title sent in the create request
    pub async fn create_page_with_title(&self, title: &str) -> PageResult<Page> {
        let ticket = self.next_ticket();
        let new_page = NewPage {
            title: title.to_string(),
            blocks: self.adapter.get_document(),
        };
        info!("Creating page '{}'", new_page.title);

        let page = self.api.create_page(&new_page).await.map_err(|e| {
            warn!("Failed to create page: {}", e);
            e
        })?;

        let mut directory = self.directory.lock();
        directory.insert(page.clone());
        if self.is_latest(ticket) {
            directory.select(Some(page.id.clone()));
            self.adapter.replace_document(page.blocks.clone());
        } else {
            debug!("Created page {} but a later selection won", page.id);
        }

        info!("Created page {}", page.id);
        Ok(page)
    }

    /// Delete a page, moving the selection if it was open
    pub async fn delete_page(&self, id: &PageId) -> PageResult<()> {
        info!("Deleting page {}", id);
        self.api.delete_page(id).await.map_err(|e| {
            warn!("Failed to delete page {}: {}", id, e);
            e
        })?;

        // An edit that has not been written yet has nowhere to go
        self.saver.discard(id);

        let reopen = {
            let mut directory = self.directory.lock();
            directory.remove(id);

            if directory.current_page_id().as_ref() != Some(id) {
                return Ok(());
            }

            match directory.first().cloned() {
                Some(first) => {
                    // Show the cached copy now so the selection never
                    // points at the deleted page
                    directory.select(Some(first.id.clone()));
                    self.adapter.replace_document(first.blocks);
                    Some(first.id)
                }
                None => {
                    directory.select(None);
                    self.adapter.replace_document(Vec::new());
                    None
                }
            }
        };

        if let Some(next) = reopen {
            let ticket = self.next_ticket();
            if let Err(e) = self.fetch_and_open(&next, ticket).await {
                warn!("Keeping cached copy of page {}: {}", next, e);
            }
        }

        Ok(())
    }

    /// Change a page's title
    pub async fn rename_page(&self, id: &PageId, title: &str) -> PageResult<Page> {
        info!("Renaming page {}", id);
        let page = self
            .api
            .update_page(id, &PageUpdate::title(title))
            .await
            .and_then(|page| confirm_id("Rename page", id, page))
            .map_err(|e| {
                warn!("Failed to rename page {}: {}", id, e);
                e
            })?;

        let mut directory = self.directory.lock();
        // Server blocks may lag behind the editor; keep the cached content
        let mut cached = directory.get(id).cloned().unwrap_or_else(|| page.clone());
        cached.title = page.title.clone();
        cached.last_modified = page.last_modified;
        directory.replace(cached);

        Ok(page)
    }

    /// Write the current edits now instead of waiting for the quiet period
    pub fn save_now(&self) {
        self.saver.save_now();
    }

    /// Flush pending edits, wait for in-flight writes, and stop the save task
    pub async fn shutdown(self) {
        let PageController {
            saver,
            subscription,
            ..
        } = self;
        subscription.unsubscribe();
        saver.shutdown().await;
    }

    // ==================== Internals ====================

    fn next_ticket(&self) -> u64 {
        self.selection_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.selection_ticket.load(Ordering::SeqCst) == ticket
    }

    async fn fetch_and_open(&self, id: &PageId, ticket: u64) -> PageResult<SelectOutcome> {
        let _loading = LoadingGuard::new(&self.loading);
        debug!("Fetching page {}", id);

        let page = self
            .api
            .get_page(id)
            .await
            .and_then(|page| confirm_id("Get page", id, page))
            .map_err(|e| {
                warn!("Failed to load page {}: {}", id, e);
                e
            })?;

        let mut directory = self.directory.lock();
        if !self.is_latest(ticket) {
            debug!("Discarding superseded response for page {}", id);
            return Ok(SelectOutcome::Discarded);
        }
        if !directory.replace(page.clone()) {
            debug!("Page {} left the directory while loading", id);
            return Ok(SelectOutcome::Discarded);
        }

        directory.select(Some(page.id.clone()));
        self.adapter.replace_document(page.blocks.clone());
        Ok(SelectOutcome::Selected(page))
    }
}

/// Subscribe the save task to editor changes
///
/// The current page id and the document are captured when the edit is
/// reported, not when the save fires.
fn bind_editor(
    adapter: &Arc<dyn EditorAdapter>,
    selection: watch::Receiver<Option<PageId>>,
    commands: mpsc::UnboundedSender<SaveCommand>,
) -> Subscription {
    let weak: Weak<dyn EditorAdapter> = Arc::downgrade(adapter);
    adapter.on_change(Box::new(move || {
        let Some(page_id) = selection.borrow().clone() else {
            return;
        };
        let Some(adapter) = weak.upgrade() else {
            return;
        };
        let _ = commands.send(SaveCommand::Changed {
            page_id,
            snapshot: adapter.get_document(),
        });
    }))
}

fn confirm_id(operation: &str, expected: &PageId, page: Page) -> PageResult<Page> {
    if &page.id == expected {
        Ok(page)
    } else {
        Err(PageError::unconfirmed(
            operation,
            format!("requested page '{}', received '{}'", expected, page.id),
        ))
    }
}
