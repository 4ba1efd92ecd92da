//! Session lifecycle.
//!
//! One session runs strictly in stages:
//! join → admission wait ‖ prepare → recording ‖ removal monitor → terminate
//!
//! Concurrency only happens inside a stage. Every path, including the early
//! aborts, ends in exactly one call to the [`Terminator`](crate::terminate::Terminator).

pub mod active;
pub mod admission;
pub mod config;
pub mod orchestrator;
pub mod reason;
pub mod status;
pub mod tokens;

pub use active::{run_active_race, ActiveOutcome};
pub use admission::{run_admission_race, AdmissionDecision, AdmissionOutcome};
pub use config::{AutomaticLeave, SessionConfig};
pub use orchestrator::SessionOrchestrator;
pub use reason::{ErrorContext, ErrorDetail, ExitStatus, LeaveReason, SessionOutcome};
pub use status::{SessionPhase, SessionState, SessionStatusHandle};
pub use tokens::ReasonTokens;
