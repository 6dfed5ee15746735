//! Queue worker: consumes analysis jobs and writes terminal records.
//!
//! Acknowledgement order is write-then-ack, so a crash between the two leaves
//! the entry pending and it is redelivered. A redelivered entry whose record
//! already exists is acked and skipped; malformed entries are acked away by
//! the broker client itself.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use vitalscan_broker::{DEFAULT_QUEUE, QueueMessage, RedisStreamBroker};
use vitalscan_jobs::{FsJobStore, JobRecord, JobStore, JobStoreError, analyzer};

const CONSUME_BATCH: usize = 10;
const CONSUME_BLOCK_MS: u64 = 1000;

fn main() -> anyhow::Result<()> {
    vitalscan_observability::init();

    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let queue = std::env::var("VITALSCAN_QUEUE").unwrap_or_else(|_| DEFAULT_QUEUE.to_string());
    let data_dir =
        PathBuf::from(std::env::var("VITALSCAN_DATA_DIR").unwrap_or_else(|_| "data/jobs".into()));

    let store = FsJobStore::open(&data_dir)
        .with_context(|| format!("opening job store at {}", data_dir.display()))?;
    let broker = RedisStreamBroker::new(&redis_url, &queue).context("configuring broker client")?;

    let consumer = format!("worker-{}", uuid::Uuid::now_v7());
    info!(%consumer, queue = broker.queue(), "worker started");

    loop {
        let batch = match broker.consume(&consumer, CONSUME_BATCH, CONSUME_BLOCK_MS) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("consume failed, retrying: {e}");
                std::thread::sleep(Duration::from_secs(1));
                continue;
            }
        };

        for (entry_id, message) in batch {
            if process(&store, &message) {
                if let Err(e) = broker.ack(&[entry_id]) {
                    warn!(job_id = %message.job_id, "ack failed: {e}");
                }
            }
        }
    }
}

/// Run one job and commit its record. Returns whether the entry may be acked.
fn process(store: &FsJobStore, message: &QueueMessage) -> bool {
    let kind = message.kind();
    let result = analyzer::analyze(&kind, &message.metadata);
    let record = JobRecord::completed(message.job_id, kind, result, false);

    match store.put(&record) {
        Ok(()) => {
            info!(job_id = %message.job_id, "job completed");
            true
        }
        Err(JobStoreError::TerminalOverwrite(job_id)) => {
            // Redelivery of an already-finished job (e.g. the fallback
            // simulator got there first).
            info!(%job_id, "job already terminal, skipping");
            true
        }
        Err(e) => {
            // Leave the entry pending so it is redelivered.
            error!(job_id = %message.job_id, "failed to persist result: {e}");
            false
        }
    }
}
