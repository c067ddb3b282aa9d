//! Shutdown coordination.
//!
//! A trigger is sticky: anything that starts waiting after it fired resolves
//! immediately.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::lifecycle::signals::wait_for_signal;

/// Cloneable handle shared by the server and whoever decides to stop it.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once [`Shutdown::trigger`] has been called on any clone.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.token.clone().cancelled_owned()
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Trigger on SIGINT/SIGTERM from a background task.
    pub fn trigger_on_signal(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            tracing::info!("Termination signal received");
            shutdown.trigger();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_every_waiter() {
        let shutdown = Shutdown::new();
        let a = tokio::spawn(shutdown.signalled());
        let b = tokio::spawn(shutdown.clone().signalled());
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), async {
            a.await.unwrap();
            b.await.unwrap();
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_late_waiter_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), shutdown.signalled())
            .await
            .unwrap();
    }
}
