//! Job status lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::error;

use vitalscan_core::{JobId, JobStatus};

use crate::store::JobStore;

/// Answer to a status poll.
///
/// There is no "not found" variant on purpose: a job ID with no stored record
/// is still in flight, and a degraded store reads the same way. Clients only
/// ever see progress or a terminal outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    Processing,
    Completed {
        result: JsonValue,
        completed_at: DateTime<Utc>,
        simulated: bool,
    },
    Failed {
        result: JsonValue,
        completed_at: DateTime<Utc>,
        simulated: bool,
    },
}

/// Read side of the pipeline.
pub struct StatusPoller {
    store: Arc<dyn JobStore>,
}

impl StatusPoller {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Report the current status of `job_id`.
    ///
    /// A store miss or a store failure both read as `Processing`; the failure
    /// is logged, not surfaced.
    pub fn poll(&self, job_id: JobId) -> PollStatus {
        let record = match self.store.get(job_id) {
            Ok(Some(record)) => record,
            Ok(None) => return PollStatus::Processing,
            Err(e) => {
                error!(%job_id, "job store read failed: {e}");
                return PollStatus::Processing;
            }
        };

        let result = record.result.unwrap_or(JsonValue::Null);
        let completed_at = record.completed_at.unwrap_or_else(Utc::now);

        match record.status {
            JobStatus::Completed => PollStatus::Completed {
                result,
                completed_at,
                simulated: record.simulated,
            },
            JobStatus::Failed => PollStatus::Failed {
                result,
                completed_at,
                simulated: record.simulated,
            },
            // Non-terminal rows are never written, but read them as in-flight
            // rather than inventing an outcome.
            JobStatus::Queued | JobStatus::Processing => PollStatus::Processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JobRecord;
    use crate::store::{InMemoryJobStore, JobStoreError};
    use serde_json::json;
    use vitalscan_core::JobKind;

    #[test]
    fn unknown_job_reads_as_processing() {
        let poller = StatusPoller::new(Arc::new(InMemoryJobStore::new()));
        assert_eq!(poller.poll(JobId::new()), PollStatus::Processing);
    }

    #[test]
    fn completed_record_carries_result_and_flag() {
        let store = Arc::new(InMemoryJobStore::new());
        let rec = JobRecord::completed(
            JobId::new(),
            JobKind::SignalAnalysis,
            json!({"heartRateBpm": 72}),
            true,
        );
        store.put(&rec).unwrap();

        let poller = StatusPoller::new(store);
        match poller.poll(rec.job_id) {
            PollStatus::Completed {
                result, simulated, ..
            } => {
                assert_eq!(result["heartRateBpm"], 72);
                assert!(simulated);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn failed_record_reads_as_failed() {
        let store = Arc::new(InMemoryJobStore::new());
        let rec = JobRecord::failed(
            JobId::new(),
            JobKind::Registration,
            json!({"error": "helper exited"}),
            false,
        );
        store.put(&rec).unwrap();

        let poller = StatusPoller::new(store);
        assert!(matches!(
            poller.poll(rec.job_id),
            PollStatus::Failed { simulated: false, .. }
        ));
    }

    #[test]
    fn store_failure_degrades_to_processing() {
        struct BrokenStore;

        impl JobStore for BrokenStore {
            fn put(&self, _record: &JobRecord) -> Result<(), JobStoreError> {
                Err(JobStoreError::Storage("disk gone".into()))
            }

            fn get(&self, _job_id: JobId) -> Result<Option<JobRecord>, JobStoreError> {
                Err(JobStoreError::Storage("disk gone".into()))
            }
        }

        let poller = StatusPoller::new(Arc::new(BrokenStore));
        assert_eq!(poller.poll(JobId::new()), PollStatus::Processing);
    }
}
