//! 2D-to-3D registration via the helper process.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::warn;

use vitalscan_core::synthetic_registration;

use crate::process::{BridgeOutcome, ProcessBridge};

/// Incoming registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Reference to the 2D image to register (path or upload handle).
    pub image: String,
    /// Acquisition modality hint, e.g. "xray".
    #[serde(default)]
    pub modality: Option<String>,
}

/// Runs registrations through the bridge, degrading to a synthetic result.
///
/// The caller always gets a full result envelope; `simulated` says whether
/// the helper produced it or this service fabricated it after the helper
/// failed or timed out.
pub struct RegistrationService {
    bridge: ProcessBridge,
}

impl RegistrationService {
    pub fn new(bridge: ProcessBridge) -> Self {
        Self { bridge }
    }

    pub async fn register(&self, request: &RegistrationRequest) -> JsonValue {
        let wire = json!({
            "action": "register",
            "image": request.image,
            "modality": request.modality,
        });

        match self.bridge.exchange(&wire).await {
            BridgeOutcome::Succeeded(result) => tag_simulated(result, false),
            BridgeOutcome::Failed(e) => {
                warn!("registration helper failed, serving simulated result: {e}");
                tag_simulated(synthetic_registration(), true)
            }
            BridgeOutcome::TimedOut => {
                warn!("registration helper timed out, serving simulated result");
                tag_simulated(synthetic_registration(), true)
            }
        }
    }
}

fn tag_simulated(mut result: JsonValue, simulated: bool) -> JsonValue {
    if let Some(map) = result.as_object_mut() {
        map.insert("simulated".to_string(), JsonValue::Bool(simulated));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::BridgeConfig;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            image: "uploads/chest-001.png".to_string(),
            modality: Some("xray".to_string()),
        }
    }

    fn service(command: PathBuf) -> RegistrationService {
        RegistrationService::new(ProcessBridge::new(BridgeConfig {
            command,
            timeout: Duration::from_secs(2),
        }))
    }

    #[tokio::test]
    async fn helper_result_is_tagged_as_real() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.sh");
        std::fs::write(
            &path,
            "#!/bin/sh\ncat > /dev/null\necho '{\"status\":\"success\",\"method\":\"cnn-v2\"}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let result = service(path).register(&request()).await;
        assert_eq!(result["method"], "cnn-v2");
        assert_eq!(result["simulated"], false);
    }

    #[tokio::test]
    async fn helper_failure_degrades_to_synthetic() {
        let result = service(PathBuf::from("/nonexistent/helper"))
            .register(&request())
            .await;

        assert_eq!(result["status"], "success");
        assert_eq!(result["simulated"], true);
        assert_eq!(result["method"], "registration-simulation");
        assert!(result["registration_metrics"]["mace_mm"].is_number());
    }
}
