//! Process-local bus with consumer groups, acknowledgement and redelivery.
//!
//! Each topic is an append-only log. Every consumer group reads the log from
//! the start with its own cursor; a delivery stays pending for its group
//! until acknowledged. Each `receive` hands out the next page of pending
//! deliveries followed by new entries.

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{BusConsumer, BusError, Delivery, Envelope, MessageBus, PendingScan, ScanStart};

#[derive(Default)]
struct TopicLog {
    entries: Vec<Envelope>,
    groups: HashMap<String, GroupCursor>,
}

#[derive(Default)]
struct GroupCursor {
    next: usize,
    pending: BTreeSet<usize>,
}

#[derive(Clone, Default)]
pub struct InMemoryBus {
    topics: Arc<Mutex<HashMap<String, TopicLog>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer for `group` on `topic`, handing out at most `batch` deliveries per receive.
    pub fn consumer(&self, topic: &str, group: &str, batch: usize) -> InMemoryConsumer {
        InMemoryConsumer {
            bus: self.clone(),
            topic: topic.to_owned(),
            group: group.to_owned(),
            batch: batch.max(1),
            pending_scan: Mutex::new(PendingScan::new(Duration::ZERO, batch)),
        }
    }

    /// Everything ever sent to `topic`, in send order.
    pub fn published(&self, topic: &str) -> Vec<Envelope> {
        self.lock()
            .ok()
            .and_then(|topics| topics.get(topic).map(|log| log.entries.clone()))
            .unwrap_or_default()
    }

    /// Deliveries handed to `group` but not yet acknowledged.
    pub fn pending(&self, topic: &str, group: &str) -> usize {
        self.lock()
            .ok()
            .and_then(|topics| {
                topics
                    .get(topic)
                    .and_then(|log| log.groups.get(group))
                    .map(|cursor| cursor.pending.len())
            })
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, TopicLog>>, BusError> {
        self.topics
            .lock()
            .map_err(|_| BusError::Transport("in-memory bus lock poisoned".into()))
    }
}

impl MessageBus for InMemoryBus {
    async fn send(&self, topic: &str, envelope: &Envelope) -> Result<(), BusError> {
        let mut topics = self.lock()?;
        topics
            .entry(topic.to_owned())
            .or_default()
            .entries
            .push(envelope.clone());
        Ok(())
    }
}

pub struct InMemoryConsumer {
    bus: InMemoryBus,
    topic: String,
    group: String,
    batch: usize,
    pending_scan: Mutex<PendingScan<usize>>,
}

impl BusConsumer for InMemoryConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn receive(&self) -> Result<Vec<Delivery>, BusError> {
        let mut topics = self.bus.lock()?;
        let TopicLog { entries, groups } = topics.entry(self.topic.clone()).or_default();
        let cursor = groups.entry(self.group.clone()).or_default();

        let mut scan = self
            .pending_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let mut batch: Vec<usize> = match scan.next_page(now) {
            None => Vec::new(),
            Some(start) => {
                let lower = match start {
                    ScanStart::FromStart => Bound::Unbounded,
                    ScanStart::After(index) => Bound::Excluded(index),
                };
                let page: Vec<usize> = cursor
                    .pending
                    .range((lower, Bound::Unbounded))
                    .copied()
                    .take(self.batch)
                    .collect();
                scan.page_read(page.last().copied(), page.len(), now);
                page
            }
        };

        let fresh_end = (cursor.next + self.batch).min(entries.len());
        for index in cursor.next..fresh_end {
            cursor.pending.insert(index);
            batch.push(index);
        }
        cursor.next = fresh_end;

        Ok(batch
            .into_iter()
            .map(|index| Delivery {
                id: index.to_string(),
                envelope: entries[index].clone(),
            })
            .collect())
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), BusError> {
        let index: usize = delivery
            .id
            .parse()
            .map_err(|_| BusError::Malformed(format!("unknown delivery id {}", delivery.id)))?;
        let mut topics = self.bus.lock()?;
        if let Some(cursor) = topics
            .get_mut(&self.topic)
            .and_then(|log| log.groups.get_mut(&self.group))
        {
            cursor.pending.remove(&index);
        }
        Ok(())
    }
}
