//! Redis Streams-backed broker client.
//!
//! - **Durable queue**: the stream is declared at connect time via
//!   `XGROUP CREATE ... MKSTREAM`; entries persist until trimmed.
//! - **At-least-once**: workers read through a consumer group and `XACK`
//!   after the terminal record is written.
//! - **Lazy connection**: at most one connection attempt is in flight at a
//!   time; repeated publishes reuse the established channel.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::{BrokerClient, BrokerError, BrokerState};
use crate::message::QueueMessage;

/// Default stream key for analysis jobs.
pub const DEFAULT_QUEUE: &str = "vitalscan:analysis";

/// Consumer group shared by all worker processes.
pub const WORKER_GROUP: &str = "vitalscan-workers";

/// Bound on connect/read/write so a broker outage cannot stall a submission.
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Broker client over a named, durable Redis Stream.
pub struct RedisStreamBroker {
    client: redis::Client,
    queue: String,
    io_timeout: Duration,
    // Lazily-established channel; the Mutex serializes connection attempts.
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisStreamBroker {
    /// Create a client for `queue` on the broker at `redis_url`.
    ///
    /// No connection is attempted here; the first publish or consume
    /// establishes the channel.
    pub fn new(redis_url: impl AsRef<str>, queue: impl Into<String>) -> Result<Self, BrokerError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| BrokerError::unavailable(e.to_string()))?;

        Ok(Self {
            client,
            queue: queue.into(),
            io_timeout: DEFAULT_IO_TIMEOUT,
            conn: Mutex::new(None),
        })
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Establish the channel if absent: connect with a bounded timeout and
    /// declare the durable queue (idempotent).
    fn ensure_channel<'a>(
        &self,
        slot: &'a mut Option<redis::Connection>,
    ) -> Result<&'a mut redis::Connection, BrokerError> {
        if slot.is_none() {
            let mut conn = self
                .client
                .get_connection_with_timeout(self.io_timeout)
                .map_err(|e| self.connect_error(e))?;

            let _ = conn.set_read_timeout(Some(self.io_timeout));
            let _ = conn.set_write_timeout(Some(self.io_timeout));

            // Declare the stream + worker group. BUSYGROUP on re-declare is
            // expected and ignored.
            let _: Result<String, _> = redis::cmd("XGROUP")
                .arg("CREATE")
                .arg(&self.queue)
                .arg(WORKER_GROUP)
                .arg("0")
                .arg("MKSTREAM")
                .query(&mut conn);

            info!(queue = %self.queue, "broker channel established");
            *slot = Some(conn);
        }

        Ok(slot.as_mut().expect("channel just established"))
    }

    fn connect_error(&self, e: redis::RedisError) -> BrokerError {
        if e.is_connection_refusal() {
            // Broker simply absent; expected in local/offline deployments.
            warn!(queue = %self.queue, "broker unreachable: {e}");
        } else {
            error!(queue = %self.queue, "broker connection error: {e}");
        }
        BrokerError::unavailable(e.to_string())
    }

    /// Read up to `count` queued messages for `consumer`, blocking at most
    /// `block_ms`. Pending redelivery is handled by the group semantics:
    /// unacked entries are re-read by `XREADGROUP` with `0` on restart.
    pub fn consume(
        &self,
        consumer: &str,
        count: usize,
        block_ms: u64,
    ) -> Result<Vec<(String, QueueMessage)>, BrokerError> {
        let mut slot = self.conn.lock().unwrap();
        let conn = self.ensure_channel(&mut slot)?;

        // RESP encodes the reply as `[stream, entries]` pairs, one per stream.
        let reply: Result<Option<Vec<(String, Vec<redis::Value>)>>, _> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(WORKER_GROUP)
            .arg(consumer)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.queue)
            .arg(">")
            .query(conn);

        let reply = match reply {
            Ok(r) => r,
            // Socket read timeout while blocked: an empty batch, not a fault.
            Err(e) if e.is_timeout() => None,
            Err(e) => {
                *slot = None;
                return Err(BrokerError::ConsumeFailed(format!("XREADGROUP failed: {e}")));
            }
        };

        let entries = reply
            .into_iter()
            .flatten()
            .find(|(stream, _)| stream == &self.queue)
            .map(|(_, entries)| entries)
            .unwrap_or_default();

        let mut messages = Vec::new();
        let mut malformed = Vec::new();
        for entry in entries {
            match parse_entry(entry) {
                Ok(parsed) => messages.push(parsed),
                Err(e) => {
                    warn!(queue = %self.queue, "skipping malformed stream entry: {}", e.reason);
                    if let Some(entry_id) = e.entry_id {
                        malformed.push(entry_id);
                    }
                }
            }
        }

        // Ack malformed entries so they do not sit in the pending list
        // forever; redelivering them would never succeed.
        if !malformed.is_empty() {
            let acked: Result<u64, _> = redis::cmd("XACK")
                .arg(&self.queue)
                .arg(WORKER_GROUP)
                .arg(&malformed)
                .query(conn);
            if let Err(e) = acked {
                warn!(queue = %self.queue, "failed to ack malformed entries: {e}");
            }
        }

        Ok(messages)
    }

    /// Acknowledge processed entries (remove them from the pending list).
    pub fn ack(&self, entry_ids: &[String]) -> Result<(), BrokerError> {
        if entry_ids.is_empty() {
            return Ok(());
        }

        let mut slot = self.conn.lock().unwrap();
        let conn = self.ensure_channel(&mut slot)?;

        let _: u64 = redis::cmd("XACK")
            .arg(&self.queue)
            .arg(WORKER_GROUP)
            .arg(entry_ids)
            .query(conn)
            .map_err(|e| BrokerError::ConsumeFailed(format!("XACK failed: {e}")))?;

        Ok(())
    }
}

impl BrokerClient for RedisStreamBroker {
    fn publish(&self, message: &QueueMessage) -> Result<(), BrokerError> {
        let payload =
            serde_json::to_string(message).map_err(|e| BrokerError::Codec(e.to_string()))?;

        let mut slot = self.conn.lock().unwrap();
        let conn = self.ensure_channel(&mut slot)?;

        let result: Result<String, _> = redis::cmd("XADD")
            .arg(&self.queue)
            .arg("*")
            .arg("jobId")
            .arg(message.job_id.to_string())
            .arg("payload")
            .arg(&payload)
            .query(conn);

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // Drop the channel so the next attempt reconnects.
                *slot = None;
                error!(queue = %self.queue, job_id = %message.job_id, "publish failed: {e}");
                Err(BrokerError::publish_failed(e.to_string()))
            }
        }
    }

    fn state(&self) -> BrokerState {
        if self.conn.lock().unwrap().is_some() {
            BrokerState::Connected
        } else {
            BrokerState::Disconnected
        }
    }
}

/// A stream entry that could not be decoded. The id is present whenever the
/// entry was well-formed enough to carry one, so the caller can ack it away.
#[derive(Debug)]
struct MalformedEntry {
    entry_id: Option<String>,
    reason: String,
}

impl MalformedEntry {
    fn new(entry_id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            entry_id,
            reason: reason.into(),
        }
    }
}

/// Parse one `[entry_id, [field, value, ...]]` stream entry.
fn parse_entry(entry: redis::Value) -> Result<(String, QueueMessage), MalformedEntry> {
    let parts = match entry {
        redis::Value::Bulk(v) => v,
        other => {
            return Err(MalformedEntry::new(
                None,
                format!("unexpected entry shape: {other:?}"),
            ));
        }
    };
    if parts.len() < 2 {
        return Err(MalformedEntry::new(None, "entry too short"));
    }

    let entry_id = match &parts[0] {
        redis::Value::Data(data) => String::from_utf8_lossy(data).to_string(),
        other => {
            return Err(MalformedEntry::new(
                None,
                format!("unexpected entry id: {other:?}"),
            ));
        }
    };

    let fields = match &parts[1] {
        redis::Value::Bulk(v) => v,
        other => {
            return Err(MalformedEntry::new(
                Some(entry_id),
                format!("unexpected field list: {other:?}"),
            ));
        }
    };

    let mut payload = None;
    for pair in fields.chunks(2) {
        if let [redis::Value::Data(key), redis::Value::Data(value)] = pair {
            if key.as_slice() == b"payload" {
                payload = Some(String::from_utf8_lossy(value).to_string());
            }
        }
    }

    let Some(payload) = payload else {
        return Err(MalformedEntry::new(
            Some(entry_id),
            "missing payload field",
        ));
    };

    let message: QueueMessage = serde_json::from_str(&payload)
        .map_err(|e| MalformedEntry::new(Some(entry_id.clone()), e.to_string()))?;

    Ok((entry_id, message))
}
