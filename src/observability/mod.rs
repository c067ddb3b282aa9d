//! Observability of the service itself.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing.rs (diagnostic events on stderr)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → Operator terminal / container log driver
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Diagnostics are separate from the application log channels
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod metrics;
pub mod tracing;
