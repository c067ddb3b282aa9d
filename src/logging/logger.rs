//! The process logger: two channels plus escalation.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;

use crate::config::validation::parse_size;
use crate::config::LoggingConfig;
use crate::escalation::{Escalation, EscalationController};
use crate::logging::channel::Channel;
use crate::logging::event::{ErrorEvent, ErrorOptions};
use crate::logging::format::{ConsoleLayout, FileLayout, Formatter};
use crate::logging::record::{Level, LogRecord, Metadata};
use crate::logging::rotating::{Retention, RotatingFileSink, RotationPolicy};
use crate::logging::sink::ConsoleSink;
use crate::notify::Notify;

/// Errors raised while setting the logger up.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("logger is already initialized")]
    AlreadyInitialized,

    #[error("invalid logging configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot create log directory {path}: {source}")]
    LogDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

struct Channels {
    http: Channel,
    app: Channel,
    escalation: EscalationController,
}

/// Dual-channel logger with failure escalation.
///
/// One instance per process, constructed explicitly and handed to every
/// collaborator. Cloning is cheap and every clone shares the same channels.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use ops_logger::config::{LoggingConfig, NotifyConfig};
/// # use ops_logger::logging::{ErrorOptions, Logger};
/// # use ops_logger::notify::NotifyClient;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let notifier = Arc::new(NotifyClient::new(&NotifyConfig::default())?);
/// let logger = Logger::from_config(&LoggingConfig::default(), notifier)?;
/// logger.http("GET /health 200");
/// logger.error("disk full", ErrorOptions::default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<OnceLock<Channels>>,
}

impl Logger {
    /// An uninitialized logger. Any log call panics until [`Logger::init`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(OnceLock::new()),
        }
    }

    /// Build the standard channels from configuration.
    pub fn from_config(
        config: &LoggingConfig,
        notifier: Arc<dyn Notify>,
    ) -> Result<Self, LoggerError> {
        let logger = Self::new();
        logger.init(config, notifier)?;
        Ok(logger)
    }

    /// A logger over caller-built channels.
    pub fn with_channels(http: Channel, app: Channel, notifier: Arc<dyn Notify>) -> Self {
        let logger = Self::new();
        // A fresh OnceLock cannot already be set.
        let _ = logger.install(http, app, notifier);
        logger
    }

    /// Initialize from configuration. Fails if already initialized.
    pub fn init(&self, config: &LoggingConfig, notifier: Arc<dyn Notify>) -> Result<(), LoggerError> {
        if self.is_initialized() {
            return Err(LoggerError::AlreadyInitialized);
        }
        let (http, app) = build_channels(config)?;
        self.install(http, app, notifier)?;
        tracing::info!(dir = %config.dir, "Logger initialized");
        Ok(())
    }

    /// Initialize from caller-built channels. Fails if already initialized.
    pub fn install(
        &self,
        http: Channel,
        app: Channel,
        notifier: Arc<dyn Notify>,
    ) -> Result<(), LoggerError> {
        let channels = Channels {
            http,
            app,
            escalation: EscalationController::new(notifier),
        };
        self.inner
            .set(channels)
            .map_err(|_| LoggerError::AlreadyInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }

    fn channels(&self) -> &Channels {
        match self.inner.get() {
            Some(channels) => channels,
            None => panic!("Logger not initialized!"),
        }
    }

    /// Record an access line on the HTTP channel.
    pub fn http(&self, message: impl Into<String>) {
        self.http_with(message, Metadata::new());
    }

    pub fn http_with(&self, message: impl Into<String>, meta: impl Into<Metadata>) {
        let record = LogRecord::new(Level::Http, message).with_metadata(meta.into());
        self.channels().http.dispatch(&record);
    }

    /// Record an informational line on the application channel.
    pub fn info(&self, message: impl Into<String>) {
        self.info_with(message, Metadata::new());
    }

    pub fn info_with(&self, message: impl Into<String>, meta: impl Into<Metadata>) {
        let record = LogRecord::new(Level::Info, message).with_metadata(meta.into());
        self.channels().app.dispatch(&record);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.warn_with(message, Metadata::new());
    }

    pub fn warn_with(&self, message: impl Into<String>, meta: impl Into<Metadata>) {
        let record = LogRecord::new(Level::Warn, message).with_metadata(meta.into());
        self.channels().app.dispatch(&record);
    }

    /// Record an error on the application channel and, unless suppressed,
    /// escalate it to the notifier.
    ///
    /// The record is persisted before the notification starts. The call
    /// returns without waiting for the notification.
    pub fn error(&self, event: impl Into<ErrorEvent>, options: ErrorOptions) {
        let channels = self.channels();
        let ErrorEvent {
            message,
            stack,
            meta: mut metadata,
        } = event.into();
        let ErrorOptions { escalation, meta } = options;
        metadata.extend(meta);
        if escalation == Escalation::Suppressed {
            metadata.insert("notify", false);
        }

        let record = LogRecord::new(Level::Error, message)
            .with_metadata(metadata)
            .with_stack(stack);
        channels.app.dispatch(&record);

        if escalation == Escalation::Notify {
            channels.escalation.escalate(self, record.message().to_string());
        }
    }

    /// Notifications started but not finished.
    pub fn pending_notifications(&self) -> usize {
        self.inner.get().map_or(0, |c| c.escalation.pending())
    }

    /// Wait up to `grace` for in-flight notifications; returns how many were abandoned.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        match self.inner.get() {
            Some(channels) => channels.escalation.shutdown(grace).await,
            None => 0,
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.get() {
            Some(c) => f
                .debug_struct("Logger")
                .field("http", &c.http)
                .field("app", &c.app)
                .field("escalation", &c.escalation)
                .finish(),
            None => f.write_str("Logger(uninitialized)"),
        }
    }
}

/// Standard wiring:
/// - `http`: console (access layout) + access group (JSON)
/// - `app`: console (detailed layout) + catch-all group (JSON, info and up)
///   + error-only group (text)
fn build_channels(config: &LoggingConfig) -> Result<(Channel, Channel), LoggerError> {
    let max_size = parse_size(&config.max_size)
        .ok_or_else(|| LoggerError::InvalidConfig(format!("max_size '{}'", config.max_size)))?;
    let retention: Retention = config
        .max_files
        .parse()
        .map_err(LoggerError::InvalidConfig)?;

    let dir = Path::new(&config.dir);
    std::fs::create_dir_all(dir).map_err(|source| LoggerError::LogDir {
        path: config.dir.clone(),
        source,
    })?;

    let group = |base: &str, layout: FileLayout, min_level: Level| {
        RotatingFileSink::new(
            RotationPolicy::new(dir, base)
                .max_size(max_size)
                .retention(retention)
                .utc(config.utc)
                .zipped_archive(config.zipped_archive)
                .min_level(min_level)
                .layout(layout),
        )
    };

    let mut http = Channel::new(
        "http",
        Formatter::new(ConsoleLayout::Access)
            .colorize(config.colorize)
            .utc(config.utc),
    );
    if config.console {
        http = http.sink(ConsoleSink::stdout("http-console"));
    }
    let http = http.sink(group(&config.access_file, FileLayout::Json, Level::Http));

    let mut app = Channel::new(
        "app",
        Formatter::new(ConsoleLayout::Detailed)
            .colorize(config.colorize)
            .utc(config.utc),
    );
    if config.console {
        app = app.sink(ConsoleSink::stdout("app-console").min_level(Level::Info));
    }
    let app = app
        .sink(group(&config.app_file, FileLayout::Json, Level::Info))
        .sink(group(&config.error_file, FileLayout::Text, Level::Error));

    Ok((http, app))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::FAILURE_PREFIX;
    use crate::logging::sink::MemorySink;
    use crate::notify::{NotifyData, NotifyError};
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails or succeeds on demand.
    struct CountingNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingNotifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Notify for CountingNotifier {
        fn notify<'a>(
            &'a self,
            _message: &'a str,
            _data: NotifyData,
        ) -> BoxFuture<'a, Result<(), NotifyError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(NotifyError::Other("connection refused".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn memory_logger(notifier: Arc<dyn Notify>) -> (Logger, MemorySink, MemorySink) {
        let http_sink = MemorySink::new("http");
        let app_sink = MemorySink::new("app");
        let logger = Logger::with_channels(
            Channel::new("http", Formatter::new(ConsoleLayout::Access)).sink(http_sink.clone()),
            Channel::new("app", Formatter::new(ConsoleLayout::Detailed)).sink(app_sink.clone()),
            notifier,
        );
        (logger, http_sink, app_sink)
    }

    #[test]
    #[should_panic(expected = "Logger not initialized!")]
    fn test_uninitialized_logger_panics() {
        Logger::new().info("too early");
    }

    #[test]
    fn test_double_init_is_rejected() {
        let (logger, _, _) = memory_logger(CountingNotifier::new(false));
        let again = logger.install(
            Channel::new("http", Formatter::new(ConsoleLayout::Access)),
            Channel::new("app", Formatter::new(ConsoleLayout::Detailed)),
            CountingNotifier::new(false),
        );
        assert!(matches!(again, Err(LoggerError::AlreadyInitialized)));
    }

    #[test]
    fn test_http_never_reaches_app_channel() {
        let (logger, http_sink, app_sink) = memory_logger(CountingNotifier::new(false));
        logger.http("GET /health 200");
        assert_eq!(http_sink.messages(), vec!["GET /health 200"]);
        assert!(app_sink.is_empty());
    }

    #[tokio::test]
    async fn test_default_error_notifies_once() {
        let notifier = CountingNotifier::new(false);
        let (logger, _, app_sink) = memory_logger(notifier.clone());

        logger.error("disk full", ErrorOptions::default());
        assert_eq!(logger.shutdown(Duration::from_secs(5)).await, 0);

        assert_eq!(notifier.calls(), 1);
        assert_eq!(app_sink.messages(), vec!["disk full"]);
    }

    #[tokio::test]
    async fn test_suppressed_error_never_notifies() {
        let notifier = CountingNotifier::new(false);
        let (logger, _, app_sink) = memory_logger(notifier.clone());

        logger.error("quiet", ErrorOptions::notify(false));
        logger.shutdown(Duration::from_secs(5)).await;

        assert_eq!(notifier.calls(), 0);
        assert_eq!(app_sink.records()[0].metadata().get("notify"), Some(&false.into()));
    }

    #[tokio::test]
    async fn test_failed_notification_logs_exactly_once() {
        let notifier = CountingNotifier::new(true);
        let (logger, _, app_sink) = memory_logger(notifier.clone());

        logger.error("disk full", ErrorOptions::default());
        logger.shutdown(Duration::from_secs(5)).await;

        assert_eq!(notifier.calls(), 1);
        let records = app_sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message(), "disk full");
        assert_eq!(
            records[1].message(),
            format!("{}connection refused", FAILURE_PREFIX)
        );
        assert_eq!(records[1].metadata().get("notify"), Some(&false.into()));
        assert!(records[1].stack().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_errors_do_not_share_suppression() {
        let notifier = CountingNotifier::new(true);
        let (logger, _, app_sink) = memory_logger(notifier.clone());

        for i in 0..10 {
            let options = if i % 2 == 0 {
                ErrorOptions::default()
            } else {
                ErrorOptions::suppressed()
            };
            logger.error(format!("event {}", i), options);
        }
        logger.shutdown(Duration::from_secs(5)).await;

        assert_eq!(notifier.calls(), 5);
        assert_eq!(app_sink.len(), 15);
    }

    #[test]
    fn test_error_without_runtime_is_logged_suppressed() {
        let notifier = CountingNotifier::new(false);
        let (logger, _, app_sink) = memory_logger(notifier.clone());

        logger.error("outside tokio", ErrorOptions::default());

        assert_eq!(notifier.calls(), 0);
        let messages = app_sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].starts_with(FAILURE_PREFIX));
    }

    #[test]
    fn test_error_options_meta_is_merged() {
        let (logger, _, app_sink) = memory_logger(CountingNotifier::new(false));
        logger.error(
            ErrorEvent::new("bad input").with_meta(Metadata::new().with("field", "email")),
            ErrorOptions::suppressed().with_meta(Metadata::new().with("request_id", "abc")),
        );

        let record = &app_sink.records()[0];
        assert_eq!(record.metadata().get("field"), Some(&"email".into()));
        assert_eq!(record.metadata().get("request_id"), Some(&"abc".into()));
    }

    #[test]
    fn test_from_config_creates_groups() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            dir: dir.path().display().to_string(),
            console: false,
            colorize: false,
            ..LoggingConfig::default()
        };
        let logger = Logger::from_config(&config, CountingNotifier::new(false)).unwrap();

        logger.http("GET / 200");
        logger.info("ready");
        logger.error("oops", ErrorOptions::suppressed());

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 3);
        assert!(names[0].starts_with("error."));
        assert!(names[1].starts_with("request."));
        assert!(names[2].starts_with("server."));
    }

    #[test]
    fn test_invalid_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            dir: dir.path().display().to_string(),
            max_size: "lots".into(),
            ..LoggingConfig::default()
        };
        let err = Logger::from_config(&config, CountingNotifier::new(false)).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfig(_)));
    }
}
