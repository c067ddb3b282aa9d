//! Log sinks.
//!
//! # Responsibilities
//! - Define the `Sink` seam every destination implements
//! - Console output (stdout, or any writer for embedding)
//! - In-memory capture for embedding and tests
//! - Contain write failures: the caller never sees them
//!
//! # Design Decisions
//! - `write` has no return value; I/O failures go to the fallback stream
//! - A sink decides which levels it accepts (severity floor)
//! - Each sink serializes its own writes so a line is appended whole

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::logging::format::Formatter;
use crate::logging::record::{Level, LogRecord};
use crate::observability::metrics;

/// Failure inside a sink. Never surfaces past the sink itself.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// A destination for records of one channel.
pub trait Sink: Send + Sync {
    /// Stable name used in diagnostics and metric labels.
    fn name(&self) -> &str;

    /// Whether a record of `level` should reach this sink.
    fn accepts(&self, level: Level) -> bool;

    /// Render and persist the record. Must not panic or return errors.
    fn write(&self, record: &LogRecord, formatter: &Formatter);
}

/// Lock a mutex, recovering the guard if a writer panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write a line that could not be persisted to the fallback stream (stderr).
pub(crate) fn report_failure(sink: &str, line: &str, error: &SinkError) {
    tracing::warn!(sink = %sink, error = %error, "Log sink write failed");
    metrics::record_sink_error(sink);
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{}", line);
}

/// Console sink rendering the channel's console layout.
pub struct ConsoleSink {
    name: String,
    min_level: Level,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// Console sink on the process stdout.
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::with_writer(name, io::stdout())
    }

    /// Console sink on an arbitrary writer.
    pub fn with_writer(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            min_level: Level::Http,
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, record: &LogRecord, formatter: &Formatter) {
        let mut line = formatter.render_console(record);
        line.push('\n');

        let mut out = lock(&self.out);
        let result = out.write_all(line.as_bytes()).and_then(|_| out.flush());
        if let Err(source) = result {
            let error = SinkError::Io {
                path: self.name.clone(),
                source,
            };
            report_failure(&self.name, line.trim_end(), &error);
        }
    }
}

/// Sink keeping records in memory.
#[derive(Clone)]
pub struct MemorySink {
    name: String,
    min_level: Level,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: Level::Http,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Snapshot of everything written so far.
    pub fn records(&self) -> Vec<LogRecord> {
        lock(&self.records).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.records)
            .iter()
            .map(|r| r.message().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, record: &LogRecord, _formatter: &Formatter) {
        lock(&self.records).push(record.clone());
    }
}
