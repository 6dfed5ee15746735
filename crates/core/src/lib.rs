//! `vitalscan-core` — domain foundation for the analysis pipeline.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! job identity, job kinds, the job status lifecycle, and the shared
//! synthetic result envelope.

pub mod error;
pub mod id;
pub mod kind;
pub mod status;
pub mod synthetic;

pub use error::{DomainError, DomainResult};
pub use id::JobId;
pub use kind::JobKind;
pub use status::JobStatus;
pub use synthetic::synthetic_registration;
