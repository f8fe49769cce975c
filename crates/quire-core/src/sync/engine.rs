//! Background save task
//!
//! Receives change notifications, debounces them, and writes page content to
//! the remote API. Writes run concurrently with new edits; only the most
//! recently issued write resolves the session's [`SaveStatus`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use crate::adapter::EditorAdapter;
use crate::api::PageApi;
use crate::directory::PageDirectory;
use crate::error::{PageError, PageResult};
use crate::models::{Block, Page, PageId, PageUpdate, SaveStatus};

/// Commands sent to the save task
#[derive(Debug, Clone)]
pub enum SaveCommand {
    /// The document changed while `page_id` was current
    Changed {
        page_id: PageId,
        snapshot: Vec<Block>,
    },
    /// Write now instead of waiting for the quiet period
    SaveNow,
    /// Forget a not-yet-issued save for a deleted page
    Discard(PageId),
    /// Flush pending work and stop
    Shutdown,
}

/// Events emitted when a write completes
#[derive(Debug, Clone, PartialEq)]
pub enum SaveEvent {
    /// Server confirmed the write
    Saved {
        page_id: PageId,
        last_modified: DateTime<Utc>,
    },
    /// Write failed
    Failed { page_id: PageId, error: PageError },
    /// Write targeted a page that has since been deleted
    Discarded { page_id: PageId },
}

/// Handle to control the save task
pub struct SaveHandle {
    command_tx: mpsc::UnboundedSender<SaveCommand>,
    status_rx: watch::Receiver<SaveStatus>,
    event_rx: Option<mpsc::UnboundedReceiver<SaveEvent>>,
    task: JoinHandle<()>,
}

impl SaveHandle {
    /// Current save status
    pub fn status(&self) -> SaveStatus {
        self.status_rx.borrow().clone()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SaveEvent>> {
        self.event_rx.take()
    }

    /// Sender for change notifications (used by the editor callback)
    pub fn command_sender(&self) -> mpsc::UnboundedSender<SaveCommand> {
        self.command_tx.clone()
    }

    /// Request an immediate write
    pub fn save_now(&self) {
        self.send(SaveCommand::SaveNow);
    }

    /// Drop a pending save for a deleted page
    pub fn discard(&self, page_id: &PageId) {
        self.send(SaveCommand::Discard(page_id.clone()));
    }

    /// Flush pending edits, wait for in-flight writes, and stop the task
    pub async fn shutdown(self) {
        self.send(SaveCommand::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Save task ended abnormally: {}", e);
        }
    }

    fn send(&self, command: SaveCommand) {
        if self.command_tx.send(command).is_err() {
            warn!("Save task is not running; command dropped");
        }
    }
}

/// Spawn the save task
///
/// `debounce` is the quiet period that must follow the last change
/// notification before a write is issued.
pub fn spawn_save_task(
    debounce: Duration,
    api: Arc<dyn PageApi>,
    adapter: Arc<dyn EditorAdapter>,
    directory: Arc<Mutex<PageDirectory>>,
) -> SaveHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(SaveStatus::default());

    let task = SaveTask {
        api,
        adapter,
        directory,
        debouncer: Debouncer::new(debounce),
        status_tx,
        event_tx,
        writes: JoinSet::new(),
        issued: 0,
        page_writes: HashMap::new(),
        last_saved: None,
    };

    let task = tokio::spawn(task.run(command_rx));

    SaveHandle {
        command_tx,
        status_rx,
        event_rx: Some(event_rx),
        task,
    }
}

/// Result of one write, tagged with its issue order
struct WriteOutcome {
    seq: u64,
    page_id: PageId,
    result: PageResult<Page>,
}

struct SaveTask {
    api: Arc<dyn PageApi>,
    adapter: Arc<dyn EditorAdapter>,
    directory: Arc<Mutex<PageDirectory>>,
    debouncer: Debouncer,
    status_tx: watch::Sender<SaveStatus>,
    event_tx: mpsc::UnboundedSender<SaveEvent>,
    writes: JoinSet<WriteOutcome>,
    /// Sequence number of the most recently issued write
    issued: u64,
    /// Sequence number of the newest write issued for each page
    page_writes: HashMap<PageId, u64>,
    last_saved: Option<DateTime<Utc>>,
}

impl SaveTask {
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<SaveCommand>) {
        let mut shutting_down = false;

        loop {
            if shutting_down && self.writes.is_empty() {
                break;
            }

            let deadline = self.debouncer.deadline();

            tokio::select! {
                cmd = command_rx.recv(), if !shutting_down => {
                    match cmd {
                        Some(SaveCommand::Changed { page_id, snapshot }) => {
                            debug!("Change on page {}, arming save timer", page_id);
                            if let Some(previous) =
                                self.debouncer.record(page_id, snapshot, Instant::now())
                            {
                                // Page switched under a pending save: write it now
                                self.issue(previous.page_id, previous.snapshot);
                            }
                        }
                        Some(SaveCommand::SaveNow) => self.save_now(),
                        Some(SaveCommand::Discard(page_id)) => {
                            if self.debouncer.discard(&page_id) {
                                debug!("Dropped pending save for deleted page {}", page_id);
                            }
                        }
                        Some(SaveCommand::Shutdown) | None => {
                            if let Some(pending) = self.debouncer.flush() {
                                self.issue(pending.page_id, pending.snapshot);
                            }
                            shutting_down = true;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(pending) = self.debouncer.take_due(Instant::now()) {
                        debug!(
                            "Quiet period elapsed for page {} ({} change(s))",
                            pending.page_id, pending.coalesced
                        );
                        self.issue(pending.page_id, pending.snapshot);
                    }
                }
                Some(joined) = self.writes.join_next(), if !self.writes.is_empty() => {
                    match joined {
                        Ok(outcome) => self.complete(outcome),
                        Err(e) => {
                            warn!("Save request task failed: {}", e);
                            self.set_status(SaveStatus::Error {
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        debug!("Save task stopped");
    }

    /// Explicit save: the pending edit if there is one, otherwise the
    /// current page's document as it stands
    fn save_now(&mut self) {
        if let Some(pending) = self.debouncer.flush() {
            self.issue(pending.page_id, pending.snapshot);
            return;
        }

        let current = self.directory.lock().current_page_id();
        match current {
            Some(page_id) => {
                let blocks = self.adapter.get_document();
                self.issue(page_id, blocks);
            }
            None => debug!("Save requested with no page open"),
        }
    }

    fn issue(&mut self, page_id: PageId, blocks: Vec<Block>) {
        self.issued += 1;
        let seq = self.issued;
        self.page_writes.insert(page_id.clone(), seq);
        self.set_status(SaveStatus::Saving);
        info!("Saving page {} ({} blocks)", page_id, blocks.len());

        let api = Arc::clone(&self.api);
        self.writes.spawn(async move {
            let update = PageUpdate::content(blocks);
            let result = api.update_page(&page_id, &update).await;
            WriteOutcome {
                seq,
                page_id,
                result,
            }
        });
    }

    fn complete(&mut self, outcome: WriteOutcome) {
        let WriteOutcome {
            seq,
            page_id,
            result,
        } = outcome;
        let latest = seq == self.issued;
        let newest_for_page = self.page_writes.get(&page_id).map_or(true, |&n| n == seq);

        let result = result.and_then(|page| {
            if page.id == page_id {
                Ok(page)
            } else {
                Err(PageError::unconfirmed(
                    "Save page",
                    format!("asked to save '{}', server confirmed '{}'", page_id, page.id),
                ))
            }
        });

        match result {
            Ok(page) => {
                let last_modified = page.last_modified;
                if newest_for_page {
                    // Cache only; the editor is never touched by a save
                    let mut directory = self.directory.lock();
                    if directory.current_page_id().as_ref() != Some(&page_id) {
                        debug!("Page {} saved after switching away", page_id);
                    }
                    directory.replace(page);
                } else {
                    debug!("Page {} has a newer write; keeping its cached copy", page_id);
                }

                self.last_saved = self.last_saved.max(Some(last_modified));
                if latest {
                    self.set_status(SaveStatus::Saved {
                        last_saved: Some(last_modified),
                    });
                }
                info!("Saved page {}", page_id);
                self.emit(SaveEvent::Saved {
                    page_id,
                    last_modified,
                });
            }
            Err(error) if error.is_not_found() && !self.directory.lock().contains(&page_id) => {
                debug!("Page {} was deleted before its save landed", page_id);
                if latest {
                    self.set_status(SaveStatus::Saved {
                        last_saved: self.last_saved,
                    });
                }
                self.emit(SaveEvent::Discarded { page_id });
            }
            Err(error) => {
                warn!("Saving page {} failed: {}", page_id, error);
                if latest {
                    self.set_status(SaveStatus::Error {
                        message: error.to_string(),
                    });
                }
                self.emit(SaveEvent::Failed { page_id, error });
            }
        }
    }

    fn set_status(&self, status: SaveStatus) {
        self.status_tx.send_replace(status);
    }

    fn emit(&self, event: SaveEvent) {
        let _ = self.event_tx.send(event);
    }
}
