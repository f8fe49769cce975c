//! Scripted in-memory page API for tests
//!
//! Behaves like the real server (ids assigned on create, 404 for unknown
//! pages) and adds knobs for latency and failure injection. Delays use
//! `tokio::time::sleep`, so paused-clock tests advance through them
//! instantly.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;

use crate::api::PageApi;
use crate::error::{PageError, PageResult};
use crate::models::{
    Block, HealthStatus, LogEntry, NewPage, Page, PageId, PageUpdate, ServerStatus,
};

/// Operations the stub can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// A request the stub received
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    List,
    Get(PageId),
    Create(NewPage),
    Update(PageId, PageUpdate),
    Delete(PageId),
}

#[derive(Default)]
struct StubState {
    pages: Vec<Page>,
    next_id: u64,
    calls: Vec<ApiCall>,
    failures: HashMap<Op, PageError>,
    list_script: VecDeque<(Duration, Vec<Page>)>,
    get_delays: HashMap<PageId, Duration>,
    update_delay: Duration,
    update_delays: VecDeque<Duration>,
}

pub struct StubApi {
    state: Mutex<StubState>,
}

impl StubApi {
    /// Stub holding `pages`; created pages get ids `len+1`, `len+2`, ...
    pub fn with_pages(pages: Vec<Page>) -> Self {
        let next_id = pages.len() as u64 + 1;
        Self {
            state: Mutex::new(StubState {
                pages,
                next_id,
                ..StubState::default()
            }),
        }
    }

    pub fn fail(&self, op: Op, error: PageError) {
        self.state.lock().failures.insert(op, error);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().failures.remove(&op);
    }

    /// Queue a list response with its latency; unscripted lists return the
    /// stored pages immediately
    pub fn script_list(&self, delay: Duration, pages: Vec<Page>) {
        self.state.lock().list_script.push_back((delay, pages));
    }

    pub fn delay_get(&self, id: &str, delay: Duration) {
        self.state.lock().get_delays.insert(PageId::from(id), delay);
    }

    pub fn delay_updates(&self, delay: Duration) {
        self.state.lock().update_delay = delay;
    }

    /// Delay the next updates one by one, ahead of `delay_updates`
    pub fn script_update_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.state.lock().update_delays.extend(delays);
    }

    /// Change a stored page behind the client's back
    pub fn set_blocks(&self, id: &str, blocks: Vec<Block>) {
        let mut state = self.state.lock();
        if let Some(page) = state.pages.iter_mut().find(|p| p.id.as_str() == id) {
            page.blocks = blocks;
        }
    }

    /// Remove a stored page without going through the API
    pub fn remove_stored(&self, id: &str) {
        self.state.lock().pages.retain(|p| p.id.as_str() != id);
    }

    pub fn stored(&self, id: &str) -> Option<Page> {
        self.state
            .lock()
            .pages
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Content writes received, in order
    pub fn saves(&self) -> Vec<(PageId, Vec<Block>)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::Update(id, update) => {
                    update.blocks.clone().map(|blocks| (id.clone(), blocks))
                }
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| {
                matches!(
                    (call, op),
                    (ApiCall::List, Op::List)
                        | (ApiCall::Get(_), Op::Get)
                        | (ApiCall::Create(_), Op::Create)
                        | (ApiCall::Update(..), Op::Update)
                        | (ApiCall::Delete(_), Op::Delete)
                )
            })
            .count()
    }

    /// Record the call and return the injected failure, if any
    fn begin(&self, call: ApiCall, op: Op) -> PageResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PageApi for StubApi {
    async fn list_pages(&self) -> PageResult<Vec<Page>> {
        self.begin(ApiCall::List, Op::List)?;
        let scripted = self.state.lock().list_script.pop_front();
        match scripted {
            Some((delay, pages)) => {
                tokio::time::sleep(delay).await;
                Ok(pages)
            }
            None => Ok(self.state.lock().pages.clone()),
        }
    }

    async fn get_page(&self, id: &PageId) -> PageResult<Page> {
        self.begin(ApiCall::Get(id.clone()), Op::Get)?;
        let delay = self.state.lock().get_delays.get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .pages
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| PageError::not_found(id))
    }

    async fn create_page(&self, page: &NewPage) -> PageResult<Page> {
        self.begin(ApiCall::Create(page.clone()), Op::Create)?;
        let mut state = self.state.lock();
        let id = state.next_id.to_string();
        state.next_id += 1;
        let created = Page::new(id, page.title.clone()).with_blocks(page.blocks.clone());
        state.pages.push(created.clone());
        Ok(created)
    }

    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> PageResult<Page> {
        self.begin(ApiCall::Update(id.clone(), update.clone()), Op::Update)?;
        let delay = {
            let mut state = self.state.lock();
            let fallback = state.update_delay;
            state.update_delays.pop_front().unwrap_or(fallback)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        let page = state
            .pages
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| PageError::not_found(id))?;
        if let Some(title) = &update.title {
            page.title = title.clone();
        }
        if let Some(blocks) = &update.blocks {
            page.blocks = blocks.clone();
        }
        page.last_modified = Utc::now();
        Ok(page.clone())
    }

    async fn delete_page(&self, id: &PageId) -> PageResult<()> {
        self.begin(ApiCall::Delete(id.clone()), Op::Delete)?;
        let mut state = self.state.lock();
        let before = state.pages.len();
        state.pages.retain(|p| &p.id != id);
        if state.pages.len() == before {
            return Err(PageError::not_found(id));
        }
        Ok(())
    }

    async fn health(&self) -> PageResult<HealthStatus> {
        Ok(HealthStatus {
            status: "ok".to_string(),
            timestamp: None,
        })
    }

    async fn server_status(&self) -> PageResult<ServerStatus> {
        let state = self.state.lock();
        Ok(ServerStatus {
            documents_count: state.pages.len() as u64,
            ..ServerStatus::default()
        })
    }

    async fn logs(&self) -> PageResult<Vec<LogEntry>> {
        Ok(Vec::new())
    }
}

/// A paragraph block with the given text
pub fn paragraph(text: &str) -> Block {
    Block::new(json!({"type": "paragraph", "content": text}))
}

/// A page with id, title and paragraphs
pub fn page(id: &str, title: &str, paragraphs: &[&str]) -> Page {
    Page::new(id, title).with_blocks(paragraphs.iter().map(|t| paragraph(t)).collect())
}
