//! HTTP notification client.
//!
//! # Responsibilities
//! - POST `{ message, user, ...extra }` as JSON to the configured endpoint
//! - Treat any 2xx as delivered, everything else as a distinct failure
//! - Report a missing URL at call time, not at construction

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::config::NotifyConfig;
use crate::notify::types::{Notify, NotifyData, NotifyError};
use crate::observability::metrics;

/// Notifier backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct NotifyClient {
    http: reqwest::Client,
    url: Option<String>,
    default_user: Option<String>,
}

impl NotifyClient {
    /// Build a client from configuration.
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone().filter(|u| !u.trim().is_empty()),
            default_user: config.user.clone(),
        })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// JSON body for a notification. Reserved keys win over extra fields.
    pub fn body(&self, message: &str, data: &NotifyData) -> Value {
        let mut body: Map<String, Value> = data
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        body.insert("message".into(), Value::from(message));
        if let Some(user) = data.user.as_ref().or(self.default_user.as_ref()) {
            body.insert("user".into(), Value::from(user.as_str()));
        }
        Value::Object(body)
    }

    /// Send one notification. No retries.
    pub async fn send(&self, message: &str, data: NotifyData) -> Result<(), NotifyError> {
        let url = self.url.as_deref().ok_or(NotifyError::MissingUrl)?;
        let body = self.body(message, &data);

        let result = match self.http.post(url).json(&body).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(NotifyError::Status(response.status())),
            Err(e) => Err(NotifyError::Transport(e)),
        };

        match &result {
            Ok(()) => {
                metrics::record_notification("sent");
                tracing::debug!(url = %url, "Notification delivered");
            }
            Err(e) => {
                metrics::record_notification("failed");
                tracing::debug!(url = %url, error = %e, "Notification failed");
            }
        }
        result
    }
}

impl Notify for NotifyClient {
    fn notify<'a>(
        &'a self,
        message: &'a str,
        data: NotifyData,
    ) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(self.send(message, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(url: Option<&str>, user: Option<&str>) -> NotifyClient {
        NotifyClient::new(&NotifyConfig {
            url: url.map(String::from),
            user: user.map(String::from),
            ..NotifyConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_body_uses_default_user() {
        let body = client(None, Some("ops")).body("disk full", &NotifyData::default());
        assert_eq!(body, json!({ "message": "disk full", "user": "ops" }));
    }

    #[test]
    fn test_body_caller_user_and_extra() {
        let data = NotifyData::default()
            .user("alice")
            .field("service", "billing")
            .field("message", "ignored");
        let body = client(None, Some("ops")).body("disk full", &data);
        assert_eq!(
            body,
            json!({ "message": "disk full", "user": "alice", "service": "billing" })
        );
    }

    #[test]
    fn test_body_without_any_user() {
        let body = client(None, None).body("x", &NotifyData::default());
        assert_eq!(body, json!({ "message": "x" }));
    }

    #[tokio::test]
    async fn test_missing_url_fails_at_call_time() {
        let err = client(None, None)
            .send("x", NotifyData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::MissingUrl));
        assert_eq!(err.to_string(), "Notify service URL is not defined.");
    }
}
