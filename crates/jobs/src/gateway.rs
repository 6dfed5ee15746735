//! Submission gateway.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use vitalscan_broker::{BrokerClient, QueueMessage};
use vitalscan_core::{JobId, JobKind};

use crate::simulator::FallbackSimulator;

/// Front door of the pipeline.
///
/// `submit` is infallible from the caller's point of view: a job always gets
/// an ID and always reaches a terminal state eventually, either through the
/// broker and a worker or through the fallback simulator.
pub struct SubmissionGateway {
    broker: Arc<dyn BrokerClient>,
    simulator: Arc<FallbackSimulator>,
}

impl SubmissionGateway {
    pub fn new(broker: Arc<dyn BrokerClient>, simulator: Arc<FallbackSimulator>) -> Self {
        Self { broker, simulator }
    }

    /// Accept a job for asynchronous processing and return its fresh ID.
    ///
    /// Never blocks on completion and never fails: a broker outage downgrades
    /// to the simulated path, not to an error.
    pub fn submit(&self, kind: JobKind, payload: JsonValue) -> JobId {
        let job_id = JobId::new();
        let message = QueueMessage::new(job_id, &kind, payload.clone());

        match self.broker.publish(&message) {
            Ok(()) => {
                info!(%job_id, kind = %kind, "job queued for analysis");
            }
            Err(e) => {
                warn!(%job_id, kind = %kind, "broker publish failed, using simulated analysis: {e}");
                self.simulator.schedule(job_id, kind, payload);
            }
        }

        job_id
    }
}
