//! Synthetic result envelopes.

use serde_json::{Value as JsonValue, json};

/// Stand-in registration result, shaped exactly like the helper's output.
///
/// Single source for the fallback constants: both the fallback simulator and
/// the registration bridge serve this envelope, so the two paths cannot
/// drift apart.
pub fn synthetic_registration() -> JsonValue {
    json!({
        "status": "success",
        "method": "registration-simulation",
        "registration_metrics": {
            "mace_mm": 0.85,
            "add_mm": 1.2,
            "confidence": 0.98,
        },
        "pose": {
            "rotation": [0.12, -0.05, 0.01],
            "translation": [5.2, 12.8, 500.0],
        },
        "volume_metadata": {
            "origin": [0, 0, 0],
            "spacing": [1.0, 1.0, 1.0],
            "dimensions": [256, 256, 256],
        },
    })
}
