//! Asynchronous analysis job pipeline.
//!
//! Submission never blocks on completion: the gateway allocates a fresh ID,
//! tries the durable broker path, and falls back to the in-process simulator
//! when the broker is unavailable. Results land in the job store only once
//! terminal; the poller maps a store miss to `Processing` so both paths look
//! identical to the client.

pub mod analyzer;
pub mod gateway;
pub mod poller;
pub mod record;
pub mod simulator;
pub mod store;

pub use gateway::SubmissionGateway;
pub use poller::{PollStatus, StatusPoller};
pub use record::JobRecord;
pub use simulator::{FallbackSimulator, SimulatorConfig};
pub use store::{FsJobStore, InMemoryJobStore, JobStore, JobStoreError};
