//! Page directory
//!
//! Local cache of the pages the server knows about, in load order, plus the
//! id of the page currently open in the editor.
//!
//! The selection is published on a `watch` channel so code that runs outside
//! the directory lock (the editor change callback) can read it.

use tokio::sync::watch;

use crate::models::{Page, PageId};

/// Ordered page cache with a single current selection
#[derive(Debug)]
pub struct PageDirectory {
    /// Cached pages, in the order the server returned them
    pages: Vec<Page>,
    /// Currently open page
    selection: watch::Sender<Option<PageId>>,
}

impl Default for PageDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDirectory {
    /// Create an empty directory with nothing selected
    pub fn new() -> Self {
        let (selection, _) = watch::channel(None);
        Self {
            pages: Vec::new(),
            selection,
        }
    }

    /// All cached pages, in load order
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Get a cached page by id
    pub fn get(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PageId) -> bool {
        self.get(id).is_some()
    }

    /// First page in load order
    pub fn first(&self) -> Option<&Page> {
        self.pages.first()
    }

    /// Id of the page currently open
    pub fn current_page_id(&self) -> Option<PageId> {
        self.selection.borrow().clone()
    }

    /// Cached copy of the page currently open
    pub fn current_page(&self) -> Option<&Page> {
        let current = self.selection.borrow();
        current.as_ref().and_then(|id| self.get(id))
    }

    /// Watch the current selection
    pub fn subscribe_selection(&self) -> watch::Receiver<Option<PageId>> {
        self.selection.subscribe()
    }

    /// Replace the whole collection (used after a full load)
    ///
    /// The selection is left alone; callers reconcile it.
    pub fn set_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
    }

    /// Append a newly created page
    ///
    /// Ids are server-assigned and unique; if one is already cached the entry
    /// is replaced in place rather than duplicated.
    pub fn insert(&mut self, page: Page) {
        if !self.replace(page.clone()) {
            self.pages.push(page);
        }
    }

    /// Update one cached page in place, keeping its position
    ///
    /// Returns false if the page is not cached.
    pub fn replace(&mut self, page: Page) -> bool {
        match self.pages.iter_mut().find(|p| p.id == page.id) {
            Some(slot) => {
                *slot = page;
                true
            }
            None => false,
        }
    }

    /// Remove a page from the cache
    ///
    /// Does not touch the selection: when the removed page was current the
    /// controller picks the next one.
    pub fn remove(&mut self, id: &PageId) -> Option<Page> {
        let pos = self.pages.iter().position(|p| &p.id == id)?;
        Some(self.pages.remove(pos))
    }

    /// Change the current selection
    pub fn select(&mut self, id: Option<PageId>) {
        self.selection.send_replace(id);
    }
}
