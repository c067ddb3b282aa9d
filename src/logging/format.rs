//! Record rendering.
//!
//! Every record has two renderings: a console line for humans and a
//! persisted line whose layout depends on the file group it lands in.
//! Empty metadata never renders as a stray `{}`.

use chrono::{DateTime, Local, Utc};
use console::{style, Color};
use serde_json::{Map, Value};

use crate::logging::record::{Level, LogRecord};

const DISPLAY_TIME: &str = "%Y-%m-%d %H:%M:%S";

/// Console line shape of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLayout {
    /// `<time>: <message>`; access lines are already self-describing.
    Access,
    /// `<time> <level>: <message>` followed by metadata and stack.
    Detailed,
}

/// Persisted line shape of a file group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLayout {
    /// One JSON object per line.
    Json,
    /// Human-readable block: `<time>: <message>`, pretty metadata, stack.
    Text,
}

/// Per-channel renderer.
#[derive(Debug, Clone)]
pub struct Formatter {
    console: ConsoleLayout,
    colorize: bool,
    utc: bool,
}

impl Formatter {
    pub fn new(console: ConsoleLayout) -> Self {
        Self {
            console,
            colorize: false,
            utc: true,
        }
    }

    pub fn colorize(mut self, enabled: bool) -> Self {
        self.colorize = enabled;
        self
    }

    /// Render display timestamps in UTC (default) or local time.
    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    /// Render the console line (without trailing newline).
    pub fn render_console(&self, record: &LogRecord) -> String {
        let time = self.display_time(record.timestamp());
        let mut out = match self.console {
            ConsoleLayout::Access => {
                format!("{}: {}", time, self.paint(record.message(), record.level()))
            }
            ConsoleLayout::Detailed => format!(
                "{} {}: {}",
                time,
                self.paint(record.level().as_str(), record.level()),
                record.message()
            ),
        };
        if self.console == ConsoleLayout::Detailed {
            push_details(&mut out, record);
        }
        out
    }

    /// Render the persisted line for the given layout (without trailing newline).
    pub fn render_file(&self, record: &LogRecord, layout: FileLayout) -> String {
        match layout {
            FileLayout::Json => render_json(record),
            FileLayout::Text => {
                let mut out = format!(
                    "{}: {}",
                    self.display_time(record.timestamp()),
                    record.message()
                );
                push_details(&mut out, record);
                out
            }
        }
    }

    fn display_time(&self, timestamp: DateTime<Utc>) -> String {
        if self.utc {
            timestamp.format(DISPLAY_TIME).to_string()
        } else {
            timestamp.with_timezone(&Local).format(DISPLAY_TIME).to_string()
        }
    }

    fn paint(&self, text: &str, level: Level) -> String {
        if !self.colorize {
            return text.to_string();
        }
        let color = match level {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Green,
            Level::Http => Color::Magenta,
        };
        style(text).fg(color).force_styling(true).to_string()
    }
}

fn push_details(out: &mut String, record: &LogRecord) {
    if !record.metadata().is_empty() {
        let pretty = serde_json::to_string_pretty(record.metadata().as_map()).unwrap_or_default();
        out.push('\n');
        out.push_str(&pretty);
    }
    if let Some(stack) = record.stack() {
        out.push('\n');
        out.push_str(stack);
    }
}

fn render_json(record: &LogRecord) -> String {
    let mut object: Map<String, Value> = record.metadata().as_map().clone();
    object.insert("level".into(), Value::from(record.level().as_str()));
    object.insert("message".into(), Value::from(record.message()));
    if let Some(stack) = record.stack() {
        object.insert("stack".into(), Value::from(stack));
    }
    object.insert(
        "timestamp".into(),
        Value::from(
            record
                .timestamp()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        ),
    );
    Value::Object(object).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::record::Metadata;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed(level: Level, message: &str) -> LogRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        LogRecord::at(at, level, message)
    }

    #[test]
    fn test_access_console_line() {
        let formatter = Formatter::new(ConsoleLayout::Access);
        let line = formatter.render_console(&fixed(Level::Http, "GET /health 200"));
        assert_eq!(line, "2024-03-09 14:05:07: GET /health 200");
    }

    #[test]
    fn test_detailed_console_with_meta_and_stack() {
        let formatter = Formatter::new(ConsoleLayout::Detailed);
        let record = fixed(Level::Error, "disk full")
            .with_metadata(Metadata::from(json!({ "volume": "/data" })))
            .with_stack(Some("disk full\nCaused by:\n    0: ENOSPC".into()));

        let line = formatter.render_console(&record);
        assert_eq!(
            line,
            "2024-03-09 14:05:07 error: disk full\n{\n  \"volume\": \"/data\"\n}\ndisk full\nCaused by:\n    0: ENOSPC"
        );
    }

    #[test]
    fn test_local_display_time_keeps_utc_json_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let record = LogRecord::at(at, Level::Info, "ready");
        let formatter = Formatter::new(ConsoleLayout::Detailed).utc(false);

        let local = at.with_timezone(&Local).format(DISPLAY_TIME).to_string();
        assert_eq!(formatter.render_console(&record), format!("{} info: ready", local));
        assert_eq!(
            formatter.render_file(&record, FileLayout::Text),
            format!("{}: ready", local)
        );

        let parsed: Value =
            serde_json::from_str(&formatter.render_file(&record, FileLayout::Json)).unwrap();
        assert_eq!(parsed["timestamp"], "2024-03-09T23:30:00.000Z");
    }

    #[test]
    fn test_empty_metadata_is_omitted() {
        let formatter = Formatter::new(ConsoleLayout::Detailed);
        let record = fixed(Level::Info, "ready");

        assert_eq!(formatter.render_console(&record), "2024-03-09 14:05:07 info: ready");
        assert_eq!(
            formatter.render_file(&record, FileLayout::Text),
            "2024-03-09 14:05:07: ready"
        );

        let json_line = formatter.render_file(&record, FileLayout::Json);
        assert!(!json_line.contains("{}"));
        let parsed: Value = serde_json::from_str(&json_line).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_json_layout_fields() {
        let formatter = Formatter::new(ConsoleLayout::Detailed);
        let record = fixed(Level::Error, "boom")
            .with_metadata(Metadata::new().with("level", "spoofed").with("code", 7))
            .with_stack(Some("trace".into()));

        let parsed: Value =
            serde_json::from_str(&formatter.render_file(&record, FileLayout::Json)).unwrap();
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["message"], "boom");
        assert_eq!(parsed["code"], 7);
        assert_eq!(parsed["stack"], "trace");
        assert_eq!(parsed["timestamp"], "2024-03-09T14:05:07.000Z");
    }

    #[test]
    fn test_colorized_level() {
        let formatter = Formatter::new(ConsoleLayout::Detailed).colorize(true);
        let line = formatter.render_console(&fixed(Level::Error, "x"));
        assert!(line.contains("\u{1b}["));
        assert!(line.ends_with(": x"));
    }

    #[test]
    fn test_rendering_does_not_mutate() {
        let formatter = Formatter::new(ConsoleLayout::Detailed);
        let record = fixed(Level::Warn, "slow").with_metadata(Metadata::new().with("ms", 900));
        let before = record.clone();
        formatter.render_console(&record);
        formatter.render_file(&record, FileLayout::Json);
        assert_eq!(record, before);
    }
}
