//! Failure notification subsystem.
//!
//! # Data Flow
//! ```text
//! escalation controller
//!     → Notify::notify(message, data)
//!     → client.rs (one HTTP POST, JSON body)
//!     → Ok(()) on 2xx, NotifyError otherwise
//! ```
//!
//! # Design Decisions
//! - Best-effort: one attempt, no retry, no queue
//! - No connection state beyond the HTTP client's own pool
//! - Every failure is a distinct `NotifyError` so it can be logged

pub mod client;
pub mod types;

pub use client::NotifyClient;
pub use types::{Notify, NotifyData, NotifyError};
