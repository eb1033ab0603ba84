//! Redis Streams adapter.
//!
//! One stream per topic. Producers `XADD`; each consuming service reads through
//! its own consumer group with `XREADGROUP` and acknowledges with `XACK`.
//! Entries a consumer received but never acknowledged stay in its pending list
//! and are re-read periodically, which gives at-least-once delivery.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use deadpool_redis::redis::{self, AsyncConnectionConfig, RedisError};
use deadpool_redis::{Connection, Manager, Pool, Runtime};

use crate::settings::BusSettings;

use super::{BusConsumer, BusError, Delivery, Envelope, MessageBus, PendingScan, ScanStart};

/// `XREADGROUP` reply: `[[stream, [[entry_id, {field: value}]]]]`, nil on timeout.
/// A pending entry already trimmed from the stream comes back with nil fields.
type StreamReply = Option<Vec<(String, Vec<(String, Option<HashMap<String, String>>)>)>>;

/// Read id selecting entries never delivered to any consumer of the group.
const NEW_ENTRIES: &str = ">";
/// Read id selecting this consumer's own pending entries.
const PENDING_ENTRIES: &str = "0";

impl From<RedisError> for BusError {
    fn from(e: RedisError) -> Self {
        if e.is_timeout() {
            BusError::Timeout
        } else {
            BusError::Transport(e.to_string())
        }
    }
}

/// Pool for the bus and the idempotency store.
///
/// Replies to a blocking `XREADGROUP` arrive up to `read_block` late, so the
/// client-side response timeout is raised above it.
pub fn connect_pool(url: &str, settings: &BusSettings) -> Result<Pool, BusError> {
    let connection =
        AsyncConnectionConfig::new().set_response_timeout(Some(settings.response_timeout()));
    let manager = Manager::new_with_config(url, connection)?;
    Pool::builder(manager)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| BusError::Pool(e.to_string()))
}

async fn connection(pool: &Pool) -> Result<Connection, BusError> {
    pool.get().await.map_err(|e| BusError::Pool(e.to_string()))
}

// ── Producer ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisStreamBus {
    pool: Pool,
    max_len: u64,
}

impl RedisStreamBus {
    pub fn new(pool: Pool, max_len: u64) -> Self {
        Self { pool, max_len }
    }
}

impl MessageBus for RedisStreamBus {
    async fn send(&self, topic: &str, envelope: &Envelope) -> Result<(), BusError> {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(topic).arg("MAXLEN").arg("~").arg(self.max_len).arg("*");
        for (field, value) in envelope.to_fields()? {
            cmd.arg(field).arg(value);
        }

        let mut conn = connection(&self.pool).await?;
        let entry_id: String = cmd.query_async(&mut conn).await?;
        tracing::trace!(topic, entry_id = %entry_id, "stream entry added");
        Ok(())
    }
}

// ── Consumer ─────────────────────────────────────────────────────────────────

/// One `XREADGROUP` reply, split by what the consumer does with each entry.
#[derive(Debug, Default, PartialEq)]
struct ReadPage {
    deliveries: Vec<Delivery>,
    /// Pending entries already trimmed from the stream.
    trimmed: Vec<String>,
    /// Entries without a readable envelope; left for the bus to dead-letter.
    malformed: Vec<String>,
    last_id: Option<String>,
    len: usize,
}

fn split_reply(reply: StreamReply) -> ReadPage {
    let mut page = ReadPage::default();
    for (_stream, entries) in reply.unwrap_or_default() {
        for (id, fields) in entries {
            page.len += 1;
            page.last_id = Some(id.clone());
            match fields.map(Envelope::from_fields) {
                Some(Ok(envelope)) => page.deliveries.push(Delivery { id, envelope }),
                Some(Err(_)) => page.malformed.push(id),
                None => page.trimmed.push(id),
            }
        }
    }
    page
}

pub struct RedisStreamConsumer {
    pool: Pool,
    topic: String,
    group: String,
    consumer: String,
    count: usize,
    block: Duration,
    pending_scan: Mutex<PendingScan<String>>,
}

impl RedisStreamConsumer {
    pub fn new(
        pool: Pool,
        topic: impl Into<String>,
        group: impl Into<String>,
        settings: &BusSettings,
    ) -> Self {
        let count = settings.read_count.max(1);
        Self {
            pool,
            topic: topic.into(),
            group: group.into(),
            consumer: settings.consumer_name.clone(),
            count,
            block: settings.read_block,
            pending_scan: Mutex::new(PendingScan::new(settings.redeliver_after, count)),
        }
    }

    /// Create the consumer group (and the stream) if missing.
    ///
    /// A new group starts at the beginning of the stream so events published
    /// before the first consumer came up are not skipped.
    pub async fn ensure_group(&self) -> Result<(), BusError> {
        let mut conn = connection(&self.pool).await?;
        let created: Result<String, RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.topic)
            .arg(&self.group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        match created {
            Ok(_) => {
                tracing::info!(topic = %self.topic, group = %self.group, "consumer group created");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn scan(&self) -> MutexGuard<'_, PendingScan<String>> {
        self.pending_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn read(
        &self,
        conn: &mut Connection,
        start: &str,
        block: Option<Duration>,
    ) -> Result<ReadPage, BusError> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.group)
            .arg(&self.consumer)
            .arg("COUNT")
            .arg(self.count);
        if let Some(block) = block {
            cmd.arg("BLOCK").arg(block.as_millis() as u64);
        }
        cmd.arg("STREAMS").arg(&self.topic).arg(start);

        let reply: StreamReply = cmd.query_async(&mut *conn).await?;
        let page = split_reply(reply);
        for id in &page.malformed {
            tracing::error!(
                topic = %self.topic,
                entry_id = %id,
                "malformed stream entry left unacknowledged"
            );
        }
        if !page.trimmed.is_empty() {
            tracing::warn!(
                topic = %self.topic,
                count = page.trimmed.len(),
                "pending entries trimmed from the stream before delivery, dropping"
            );
            self.xack(conn, &page.trimmed).await?;
        }
        Ok(page)
    }

    /// Next page of this consumer's pending entries, if a scan is due.
    async fn read_pending(&self, conn: &mut Connection) -> Result<Vec<Delivery>, BusError> {
        let next = self.scan().next_page(Instant::now());
        let start = match next {
            None => return Ok(Vec::new()),
            Some(ScanStart::FromStart) => PENDING_ENTRIES.to_owned(),
            Some(ScanStart::After(id)) => id,
        };
        let page = self.read(conn, &start, None).await?;
        self.scan().page_read(page.last_id, page.len, Instant::now());
        if !page.deliveries.is_empty() {
            tracing::debug!(
                topic = %self.topic,
                count = page.deliveries.len(),
                "redelivering pending entries"
            );
        }
        Ok(page.deliveries)
    }

    async fn xack(&self, conn: &mut Connection, ids: &[String]) -> Result<(), BusError> {
        let _acked: i64 = redis::cmd("XACK")
            .arg(&self.topic)
            .arg(&self.group)
            .arg(ids)
            .query_async(conn)
            .await?;
        Ok(())
    }
}

impl BusConsumer for RedisStreamConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn receive(&self) -> Result<Vec<Delivery>, BusError> {
        let mut conn = connection(&self.pool).await?;
        let mut deliveries = self.read_pending(&mut conn).await?;

        // Redeliveries are waiting, so new entries are only picked up, not awaited.
        let block = deliveries.is_empty().then_some(self.block);
        match self.read(&mut conn, NEW_ENTRIES, block).await {
            Ok(page) => deliveries.extend(page.deliveries),
            Err(e) if !deliveries.is_empty() => {
                tracing::warn!(topic = %self.topic, error = %e, "reading new entries failed");
            }
            Err(e) => return Err(e),
        }
        Ok(deliveries)
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), BusError> {
        let mut conn = connection(&self.pool).await?;
        self.xack(&mut conn, std::slice::from_ref(&delivery.id)).await
    }
}
