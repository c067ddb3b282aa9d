//! Structured logging subsystem.
//!
//! # Data Flow
//! ```text
//! Logger::http(..)              Logger::info/warn/error(..)
//!     → LogRecord                   → LogRecord
//!     → channel "http"              → channel "app"
//!         → console (access)            → console (detailed)
//!         → request.<date>.log          → server.<date>.log  (info and up, JSON)
//!                                       → error.<date>.log   (error only, text)
//!                                   → error records: escalation (see crate::escalation)
//! ```
//!
//! # Design Decisions
//! - Records are built and dispatched synchronously; callers never await
//! - Within a channel, sinks always see a record in registration order
//! - The two channels never share a sink
//! - Sink I/O failures are contained inside the sink
//! - Logging before initialization is a programming error and panics

pub mod channel;
pub mod event;
pub mod format;
pub mod logger;
pub mod record;
pub mod rotating;
pub mod sink;

pub use channel::Channel;
pub use event::{ErrorEvent, ErrorOptions};
pub use format::{ConsoleLayout, FileLayout, Formatter};
pub use logger::{Logger, LoggerError};
pub use record::{Level, LogRecord, Metadata};
pub use rotating::{
    BucketZone, Clock, ManualClock, Retention, RotatingFileSink, RotationPolicy, SystemClock,
};
pub use sink::{ConsoleSink, MemorySink, Sink, SinkError};
