//! One-shot JSON exchange with a helper executable.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Helper executable to spawn per exchange.
    pub command: PathBuf,
    /// Hard deadline for the whole exchange, spawn to exit.
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("scripts/registration-helper"),
            timeout: Duration::from_secs(12),
        }
    }
}

/// Why an exchange failed.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The helper executable could not be started.
    #[error("failed to spawn helper: {0}")]
    SpawnFailed(String),

    /// An I/O error while talking to the helper.
    #[error("helper io error: {0}")]
    Io(String),

    /// The helper ran but exited non-zero.
    #[error("helper exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// The helper's stdout was not valid JSON.
    #[error("helper produced unparseable output: {0}")]
    ParseFailed(String),
}

/// Result of a single exchange.
///
/// Timeout is its own arm, not an error variant: callers treat a slow helper
/// differently from a broken one (the deadline is policy, the rest is fault).
#[derive(Debug)]
pub enum BridgeOutcome {
    Succeeded(JsonValue),
    Failed(BridgeError),
    TimedOut,
}

/// Spawns the helper once per request and reads a single JSON reply.
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    config: BridgeConfig,
}

impl ProcessBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Send `request` to a fresh helper process and wait for its reply.
    ///
    /// The request is written to stdin as one JSON line, then stdin is
    /// closed; the reply is the last non-empty stdout line. If the deadline
    /// passes first the child is killed and `TimedOut` is returned.
    pub async fn exchange(&self, request: &JsonValue) -> BridgeOutcome {
        let mut child = match Command::new(&self.config.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return BridgeOutcome::Failed(BridgeError::SpawnFailed(format!(
                    "{}: {e}",
                    self.config.command.display()
                )));
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let mut line = request.to_string().into_bytes();
            line.push(b'\n');
            if let Err(e) = stdin.write_all(&line).await {
                return BridgeOutcome::Failed(BridgeError::Io(e.to_string()));
            }
            // Dropping stdin closes the pipe so the helper sees EOF.
        }

        // wait_with_output owns the child; dropping it on timeout triggers
        // kill_on_drop, so a hung helper does not outlive the deadline.
        let output = match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return BridgeOutcome::Failed(BridgeError::Io(e.to_string())),
            Err(_) => {
                warn!(
                    command = %self.config.command.display(),
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "helper exceeded deadline, killing it"
                );
                return BridgeOutcome::TimedOut;
            }
        };

        if !output.status.success() {
            return BridgeOutcome::Failed(BridgeError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return BridgeOutcome::Failed(BridgeError::ParseFailed("empty stdout".to_string()));
        }

        // The whole buffer is the reply (it may be pretty-printed across
        // lines); a helper that logs to stdout before answering is handled
        // by retrying with just the last non-empty line.
        let parsed = serde_json::from_str(trimmed).or_else(|whole_buffer_err| {
            trimmed
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line.trim()))
                .unwrap_or(Err(whole_buffer_err))
        });

        match parsed {
            Ok(value) => {
                debug!(command = %self.config.command.display(), "helper exchange succeeded");
                BridgeOutcome::Succeeded(value)
            }
            Err(e) => BridgeOutcome::Failed(BridgeError::ParseFailed(e.to_string())),
        }
    }
}
