//! Scheduling of pending-list re-reads.
//!
//! A scan walks a consumer's pending deliveries page by page, each page
//! starting after the last id of the previous one, and ends on the first short
//! page. The next scan starts `interval` after that. Consumers read new entries
//! on every receive as well, so a page of deliveries that keep failing never
//! holds back the rest of the topic.

use std::time::{Duration, Instant};

/// Where the next pending page starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStart<Id> {
    FromStart,
    After(Id),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState<Id> {
    Due,
    Resume(Id),
    Idle(Instant),
}

#[derive(Debug)]
pub struct PendingScan<Id> {
    interval: Duration,
    page_size: usize,
    state: ScanState<Id>,
}

impl<Id: Clone> PendingScan<Id> {
    /// The first scan is due immediately.
    pub fn new(interval: Duration, page_size: usize) -> Self {
        Self {
            interval,
            page_size: page_size.max(1),
            state: ScanState::Due,
        }
    }

    /// Start of the page to read at `now`, or `None` when no scan is due.
    pub fn next_page(&self, now: Instant) -> Option<ScanStart<Id>> {
        match &self.state {
            ScanState::Due => Some(ScanStart::FromStart),
            ScanState::Resume(id) => Some(ScanStart::After(id.clone())),
            ScanState::Idle(since) => (now.saturating_duration_since(*since) >= self.interval)
                .then_some(ScanStart::FromStart),
        }
    }

    /// Record a page of `len` entries whose last id is `last`.
    pub fn page_read(&mut self, last: Option<Id>, len: usize, now: Instant) {
        self.state = match last {
            Some(id) if len >= self.page_size => ScanState::Resume(id),
            _ => ScanState::Idle(now),
        };
    }
}
