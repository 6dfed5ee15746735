//! Queue message schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use vitalscan_core::{JobId, JobKind};

/// Message published to the analysis queue.
///
/// The payload is opaque to the pipeline; it is echoed through to the worker
/// under `metadata` and never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub job_id: JobId,
    pub timestamp: DateTime<Utc>,
    pub file_type: String,
    pub metadata: JsonValue,
}

impl QueueMessage {
    pub fn new(job_id: JobId, kind: &JobKind, metadata: JsonValue) -> Self {
        Self {
            job_id,
            timestamp: Utc::now(),
            file_type: kind.as_str().to_string(),
            metadata,
        }
    }

    pub fn kind(&self) -> JobKind {
        JobKind::from(self.file_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_camel_case() {
        let msg = QueueMessage::new(
            JobId::new(),
            &JobKind::SignalAnalysis,
            serde_json::json!({"samplingRate": 500}),
        );

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("jobId").is_some());
        assert!(json.get("timestamp").is_some());
        assert_eq!(json["fileType"], "signal-analysis");
        assert_eq!(json["metadata"]["samplingRate"], 500);
    }

    #[test]
    fn kind_roundtrips_through_file_type() {
        let msg = QueueMessage::new(JobId::new(), &JobKind::Registration, JsonValue::Null);
        assert_eq!(msg.kind(), JobKind::Registration);
    }
}
