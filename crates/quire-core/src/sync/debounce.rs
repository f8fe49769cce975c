//! Trailing-edge debounce state
//!
//! Pure bookkeeping with no timers of its own: the save task feeds it change
//! notifications and the current time, and asks it what is due.

use std::time::Duration;

use tokio::time::Instant;

use crate::models::{Block, PageId};

/// A save waiting for its quiet period to elapse
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    /// Page the edits were made on, captured when the timer was armed
    pub page_id: PageId,
    /// Document as of the last change notification
    pub snapshot: Vec<Block>,
    /// When the save becomes due
    pub deadline: Instant,
    /// Notifications coalesced into this save
    pub coalesced: usize,
}

/// Coalesces change notifications into at most one pending save
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<PendingSave>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a change notification for `page_id`
    ///
    /// Restarts the quiet period. If a save for a *different* page was
    /// pending it can no longer wait (its page is off screen) and is returned
    /// so the caller issues it immediately.
    pub fn record(
        &mut self,
        page_id: PageId,
        snapshot: Vec<Block>,
        now: Instant,
    ) -> Option<PendingSave> {
        let deadline = now + self.window;

        match self.pending.take() {
            Some(mut pending) if pending.page_id == page_id => {
                pending.snapshot = snapshot;
                pending.deadline = deadline;
                pending.coalesced += 1;
                self.pending = Some(pending);
                None
            }
            other => {
                self.pending = Some(PendingSave {
                    page_id,
                    snapshot,
                    deadline,
                    coalesced: 1,
                });
                other
            }
        }
    }

    /// When the pending save becomes due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Page the pending save targets, if any
    pub fn pending_page(&self) -> Option<&PageId> {
        self.pending.as_ref().map(|p| &p.page_id)
    }

    /// Take the pending save if its quiet period has elapsed
    pub fn take_due(&mut self, now: Instant) -> Option<PendingSave> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Take the pending save regardless of its deadline
    pub fn flush(&mut self) -> Option<PendingSave> {
        self.pending.take()
    }

    /// Drop the pending save if it targets `page_id`
    pub fn discard(&mut self, page_id: &PageId) -> bool {
        if self.pending_page() == Some(page_id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WINDOW: Duration = Duration::from_millis(1000);

    fn doc(n: u64) -> Vec<Block> {
        vec![Block::new(json!({"type": "paragraph", "content": n}))]
    }

    #[test]
    fn test_notifications_restart_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        for i in 0..5u64 {
            let now = start + Duration::from_millis(300 * i);
            assert!(debouncer.record("a".into(), doc(i), now).is_none());
            assert!(debouncer.take_due(now).is_none());
        }

        let last = start + Duration::from_millis(1200);
        assert_eq!(debouncer.deadline(), Some(last + WINDOW));
        assert!(debouncer.take_due(last + WINDOW - Duration::from_millis(1)).is_none());

        let due = debouncer.take_due(last + WINDOW).unwrap();
        assert_eq!(due.page_id, PageId::from("a"));
        assert_eq!(due.snapshot, doc(4));
        assert_eq!(due.coalesced, 5);
        assert!(debouncer.deadline().is_none());
    }

    #[test]
    fn test_other_page_flushes_previous() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.record("a".into(), doc(1), now);
        let flushed = debouncer
            .record("b".into(), doc(2), now + Duration::from_millis(10))
            .unwrap();

        assert_eq!(flushed.page_id, PageId::from("a"));
        assert_eq!(flushed.snapshot, doc(1));
        assert_eq!(debouncer.pending_page(), Some(&PageId::from("b")));
    }

    #[test]
    fn test_discard_only_matching_page() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.record("a".into(), doc(1), now);

        assert!(!debouncer.discard(&"b".into()));
        assert!(debouncer.discard(&"a".into()));
        assert!(debouncer.flush().is_none());
    }

    #[test]
    fn test_flush_ignores_deadline() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.record("a".into(), doc(1), now);

        let flushed = debouncer.flush().unwrap();
        assert_eq!(flushed.snapshot, doc(1));
        assert!(debouncer.take_due(now + WINDOW * 2).is_none());
    }
}
