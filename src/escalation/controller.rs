//! Escalation of error records to the notifier.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::logging::event::{ErrorEvent, ErrorOptions};
use crate::logging::Logger;
use crate::notify::{Notify, NotifyData, NotifyError};
use crate::observability::metrics;

/// How long cancelled notifications get to record their failure.
const CANCEL_DRAIN: Duration = Duration::from_millis(250);

/// Prefix of the record written when a notification fails.
pub const FAILURE_PREFIX: &str = "Failed to send notification: ";

/// Per-call escalation state.
///
/// A caller's `error()` starts in `Notify`. The controller's own report of a
/// failed notification is logged in `Suppressed`, which never escalates, so
/// the chain is at most one level deep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Escalation {
    #[default]
    Notify,
    Suppressed,
}

/// Fires one detached notification per escalated error record.
pub struct EscalationController {
    notifier: Arc<dyn Notify>,
    tasks: TaskTracker,
    cancel: CancellationToken,
    runtime: Option<Handle>,
}

impl EscalationController {
    /// Captures the current Tokio runtime, if any, as the fallback for calls
    /// made from threads outside it.
    pub fn new(notifier: Arc<dyn Notify>) -> Self {
        Self {
            notifier,
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Notifications still in flight.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Start the notification for an error record that is already persisted.
    ///
    /// Never blocks and never fails: a failed notification is logged through
    /// `logger` with escalation suppressed.
    pub(crate) fn escalate(&self, logger: &Logger, message: String) {
        let Some(handle) = Handle::try_current().ok().or_else(|| self.runtime.clone()) else {
            report_failure(logger, &NotifyError::NoRuntime);
            return;
        };

        let notifier = self.notifier.clone();
        let cancel = self.cancel.clone();
        let logger = logger.clone();
        self.tasks.spawn_on(
            async move {
                let outcome = tokio::select! {
                    result = notifier.notify(&message, NotifyData::default()) => result,
                    _ = cancel.cancelled() => Err(NotifyError::Cancelled),
                };
                if let Err(e) = outcome {
                    report_failure(&logger, &e);
                }
            },
            &handle,
        );
    }

    /// Wait up to `grace` for in-flight notifications, then abandon the rest.
    ///
    /// Returns how many were abandoned. Abandoned notifications are logged as
    /// failed (suppressed) before this returns, when they manage to within a
    /// short drain window.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.tasks.close();
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_ok() {
            return 0;
        }

        let abandoned = self.tasks.len();
        tracing::warn!(abandoned, "Abandoning in-flight notifications at shutdown");
        self.cancel.cancel();
        let _ = tokio::time::timeout(CANCEL_DRAIN, self.tasks.wait()).await;
        abandoned
    }
}

impl std::fmt::Debug for EscalationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationController")
            .field("pending", &self.tasks.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

fn report_failure(logger: &Logger, error: &NotifyError) {
    if matches!(error, NotifyError::Cancelled) {
        metrics::record_notification("abandoned");
    }
    logger.error(
        ErrorEvent::new(format!("{}{}", FAILURE_PREFIX, error)).with_source(error),
        ErrorOptions::suppressed(),
    );
}
