//! Escalation subsystem.
//!
//! # Data Flow
//! ```text
//! Logger::error(event, options)
//!     → app channel persists the record (always first)
//!     → options.escalation == Notify?
//!         → controller.rs spawns a detached, tracked notification task
//!         → on failure: Logger::error("Failed to send notification: ..", Suppressed)
//!     → options.escalation == Suppressed: stop
//! ```
//!
//! # Design Decisions
//! - Suppression travels with the call, never in shared state
//! - At most one notification attempt per originating error
//! - Notification tasks are tied to process shutdown, not to the request
//!   that produced the error
//! - Shutdown waits a bounded time, then abandons what is left

pub mod controller;

pub use controller::{Escalation, EscalationController, FAILURE_PREFIX};
