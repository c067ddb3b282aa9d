//! Channels: one formatter plus an ordered list of sinks.

use std::fmt;
use std::sync::Arc;

use crate::logging::format::Formatter;
use crate::logging::record::LogRecord;
use crate::logging::sink::Sink;
use crate::observability::metrics;

/// A named pairing of a formatter and the sinks it feeds.
///
/// Sinks receive each record in registration order; the console sink is
/// registered first by convention so it sees the record before any file.
pub struct Channel {
    name: String,
    formatter: Formatter,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Channel {
    pub fn new(name: impl Into<String>, formatter: Formatter) -> Self {
        Self {
            name: name.into(),
            formatter,
            sinks: Vec::new(),
        }
    }

    /// Append a sink to the fan-out order.
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Fan the record out to every sink that accepts its level.
    pub fn dispatch(&self, record: &LogRecord) {
        metrics::record_log(&self.name, record.level().as_str());
        for sink in self.sinks.iter().filter(|s| s.accepts(record.level())) {
            sink.write(record, &self.formatter);
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("formatter", &self.formatter)
            .field("sinks", &self.sink_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::format::ConsoleLayout;
    use crate::logging::record::Level;
    use crate::logging::sink::MemorySink;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Sink for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn accepts(&self, _level: Level) -> bool {
            true
        }

        fn write(&self, _record: &LogRecord, _formatter: &Formatter) {
            self.order.lock().unwrap().push(self.name);
        }
    }

    #[test]
    fn test_dispatch_order_is_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let channel = Channel::new("app", Formatter::new(ConsoleLayout::Detailed))
            .sink(Recorder { name: "console", order: order.clone() })
            .sink(Recorder { name: "file", order: order.clone() });

        channel.dispatch(&LogRecord::new(Level::Info, "a"));
        channel.dispatch(&LogRecord::new(Level::Info, "b"));

        assert_eq!(*order.lock().unwrap(), vec!["console", "file", "console", "file"]);
    }

    #[test]
    fn test_dispatch_respects_severity_floor() {
        let all = MemorySink::new("all");
        let errors = MemorySink::new("errors").min_level(Level::Error);
        let channel = Channel::new("app", Formatter::new(ConsoleLayout::Detailed))
            .sink(all.clone())
            .sink(errors.clone());

        channel.dispatch(&LogRecord::new(Level::Info, "fine"));
        channel.dispatch(&LogRecord::new(Level::Error, "broken"));

        assert_eq!(all.messages(), vec!["fine", "broken"]);
        assert_eq!(errors.messages(), vec!["broken"]);
    }
}
