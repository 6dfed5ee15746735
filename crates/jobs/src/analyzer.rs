//! Deterministic analysis result construction.
//!
//! Both completion paths go through [`analyze`]: the worker runs it over real
//! queue payloads and the fallback simulator over whatever was submitted.
//! Keeping one producer per result shape is what makes the two paths
//! indistinguishable to the poller except for the `simulated` flag.

use serde_json::{Value as JsonValue, json};

use vitalscan_core::{JobKind, synthetic_registration};

/// Analyze a submitted signal payload.
///
/// Deterministic: the same payload always yields the same result, so worker
/// and simulator output stay reproducible under test.
pub fn analyze_signal(payload: &JsonValue) -> JsonValue {
    let sampling_rate = payload
        .get("samplingRate")
        .and_then(JsonValue::as_u64)
        .unwrap_or(250);

    // Derived, not measured: a stable stand-in for the model output.
    let heart_rate = 60 + (sampling_rate % 40);

    json!({
        "heartRateBpm": heart_rate,
        "rhythm": "normal-sinus",
        "qrsDurationMs": 96,
        "confidence": 0.93,
        "samplingRate": sampling_rate,
    })
}

/// Produce the result for `kind`.
///
/// Whether the outcome counts as real or simulated is decided by the caller
/// when it writes the record, not here.
pub fn analyze(kind: &JobKind, payload: &JsonValue) -> JsonValue {
    match kind {
        JobKind::SignalAnalysis => analyze_signal(payload),
        JobKind::Registration => synthetic_registration(),
        JobKind::Custom(tag) => json!({
            "status": "success",
            "kind": tag,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_analysis_is_deterministic() {
        let payload = json!({"samplingRate": 500});
        assert_eq!(analyze_signal(&payload), analyze_signal(&payload));
    }

    #[test]
    fn signal_analysis_tolerates_missing_fields() {
        let result = analyze_signal(&JsonValue::Null);
        assert!(result.get("heartRateBpm").is_some());
        assert_eq!(result["samplingRate"], 250);
    }

    #[test]
    fn registration_jobs_get_the_shared_envelope() {
        let result = analyze(&JobKind::Registration, &JsonValue::Null);
        assert_eq!(result, synthetic_registration());
        assert!(result["registration_metrics"]["mace_mm"].is_number());
    }

    #[test]
    fn custom_kinds_get_a_minimal_success_envelope() {
        let result = analyze(&JobKind::Custom("gait".into()), &JsonValue::Null);
        assert_eq!(result["status"], "success");
        assert_eq!(result["kind"], "gait");
    }
}
