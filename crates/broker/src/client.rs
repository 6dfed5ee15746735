//! Broker client abstraction.

use thiserror::Error;

use crate::message::QueueMessage;

/// Connection state of a broker client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    Connected,
    Disconnected,
}

/// Broker-side failure.
///
/// All variants are non-fatal to the caller: the submission gateway maps any
/// of them to the local fallback path instead of surfacing an error.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker could not be reached at all (connection refused, DNS,
    /// timeout). Expected in local/offline deployments.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// A channel exists but the publish itself failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// A channel exists but reading from the queue failed.
    #[error("consume failed: {0}")]
    ConsumeFailed(String),

    /// A message could not be encoded or decoded.
    #[error("message codec error: {0}")]
    Codec(String),
}

impl BrokerError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }
}

/// Publisher side of the analysis queue.
///
/// Injectable seam: the gateway only sees this trait, so tests substitute a
/// fake and production wires [`crate::RedisStreamBroker`].
pub trait BrokerClient: Send + Sync {
    /// Publish a message to the durable queue.
    ///
    /// Must return promptly (bounded connect/IO timeouts) — a broker outage
    /// is reported as an `Err`, never by blocking the caller indefinitely.
    fn publish(&self, message: &QueueMessage) -> Result<(), BrokerError>;

    /// Current connection state, for diagnostics.
    fn state(&self) -> BrokerState;
}
