//! Notification types and error definitions.

use std::collections::BTreeMap;

use futures_util::future::BoxFuture;
use thiserror::Error;

/// Optional fields sent along with a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyData {
    /// Overrides the configured default user.
    pub user: Option<String>,
    /// Extra string fields merged into the JSON body.
    pub extra: BTreeMap<String, String>,
}

impl NotifyData {
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Reasons a notification was not delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No destination URL configured.
    #[error("Notify service URL is not defined.")]
    MissingUrl,

    /// Request could not be sent or the response could not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-2xx status.
    #[error("notification endpoint responded with {0}")]
    Status(reqwest::StatusCode),

    /// No Tokio runtime was reachable to run the request on.
    #[error("no async runtime available to send notification")]
    NoRuntime,

    /// Abandoned because the process is shutting down.
    #[error("notification abandoned at shutdown")]
    Cancelled,

    /// Failure reported by a custom notifier.
    #[error("{0}")]
    Other(String),
}

/// Something that can deliver a one-line alert.
///
/// Implementations make exactly one attempt per call: no retries, no queue.
pub trait Notify: Send + Sync {
    fn notify<'a>(
        &'a self,
        message: &'a str,
        data: NotifyData,
    ) -> BoxFuture<'a, Result<(), NotifyError>>;
}
