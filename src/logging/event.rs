//! Error-call normalization.
//!
//! `Logger::error` accepts a bare message, an error object, or a message with
//! an accompanying error. All three become an [`ErrorEvent`].

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

use crate::escalation::Escalation;
use crate::logging::record::Metadata;

/// Normalized input of an error-level log call.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub(crate) message: String,
    pub(crate) stack: Option<String>,
    pub(crate) meta: Metadata,
}

impl ErrorEvent {
    /// A plain message without an error object.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            meta: Metadata::new(),
        }
    }

    /// Use the error's own message; the stack is its source chain.
    pub fn from_error(error: &dyn Error) -> Self {
        Self::new(error.to_string()).with_source(error)
    }

    /// Attach an error object; the stack is its source chain.
    pub fn with_source(mut self, error: &dyn Error) -> Self {
        self.stack = Some(render_stack(error));
        self
    }

    pub fn with_meta(mut self, meta: impl Into<Metadata>) -> Self {
        self.meta.extend(meta.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl From<&str> for ErrorEvent {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ErrorEvent {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// `<error>` then `Caused by:` with one numbered line per source, then the
/// call-site backtrace when `RUST_BACKTRACE` enables capture.
fn render_stack(error: &dyn Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    if source.is_some() {
        out.push_str("\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        out.push_str(&format!("\n    {}: {}", depth, cause));
        depth += 1;
        source = cause.source();
    }

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        out.push_str("\nstack backtrace:\n");
        out.push_str(&backtrace.to_string());
    }
    out
}

/// Options of an error-level log call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorOptions {
    /// Whether this record escalates to the notifier.
    pub escalation: Escalation,
    /// Extra fields merged into the record's metadata.
    pub meta: Metadata,
}

impl ErrorOptions {
    /// `notify: true` (the default) or `notify: false`.
    pub fn notify(enabled: bool) -> Self {
        Self {
            escalation: if enabled {
                Escalation::Notify
            } else {
                Escalation::Suppressed
            },
            meta: Metadata::new(),
        }
    }

    /// Log without notifying.
    pub fn suppressed() -> Self {
        Self::notify(false)
    }

    pub fn with_meta(mut self, meta: impl Into<Metadata>) -> Self {
        self.meta.extend(meta.into());
        self
    }
}
