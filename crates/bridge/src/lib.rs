//! Bridge to the external registration helper process.
//!
//! The helper is a separate executable spoken to over stdin/stdout with
//! newline-delimited JSON. Every exchange spawns a fresh process and is
//! bounded by an explicit timeout; a helper that hangs is killed, never
//! waited on forever.

pub mod process;
pub mod registration;

pub use process::{BridgeConfig, BridgeError, BridgeOutcome, ProcessBridge};
pub use registration::{RegistrationRequest, RegistrationService};
