//! Broker client: durable queue dispatch for analysis jobs.
//!
//! The queue is a Redis Stream: `XADD` gives durable publication, and the
//! worker consumes through a consumer group (`XREADGROUP`/`XACK`) for
//! at-least-once delivery. The client holds a lazily-established connection
//! and degrades to an error result — never a panic — when the broker is
//! unreachable, so callers can fall back to local simulation.

pub mod client;
pub mod message;
pub mod redis_stream;

pub use client::{BrokerClient, BrokerError, BrokerState};
pub use message::QueueMessage;
pub use redis_stream::{DEFAULT_QUEUE, RedisStreamBroker, WORKER_GROUP};
