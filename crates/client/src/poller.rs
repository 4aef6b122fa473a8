//! Background notification refresh.
//!
//! The header badge shows the unread count. A [`NotificationPoller`] fetches
//! the list immediately and then on a fixed interval, publishing the count on
//! a `watch` channel. There is no jitter and no backoff; a failed fetch is
//! logged and the next tick tries again.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::notifications::unread_count;
use crate::api::{ApiClient, ApiError};

/// Handle to a running poll task. Dropping it stops the task.
#[derive(Debug)]
pub struct NotificationPoller {
    unread: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl NotificationPoller {
    /// Start polling with `client` every `every`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(client: ApiClient, every: Duration) -> Self {
        let (tx, unread) = watch::channel(0);
        let every = every.max(Duration::from_millis(1));

        info!(interval_secs = every.as_secs(), "Notification poller started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                match client.list_notifications().await {
                    Ok(list) => {
                        let count = unread_count(&list);
                        debug!(unread = count, "Notifications refreshed");
                        tx.send_replace(count);
                    }
                    Err(ApiError::Unauthorized) => {
                        info!("Session ended; notification poller stopping");
                        break;
                    }
                    Err(e) => warn!(error = %e, "Failed to refresh notifications"),
                }
            }
        });

        Self { unread, task }
    }

    /// Latest unread count.
    #[must_use]
    pub fn unread(&self) -> usize {
        *self.unread.borrow()
    }

    /// A receiver that is notified on every refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.unread.clone()
    }

    /// Stop polling.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Whether the task has ended, by [`stop`](Self::stop) or an expired session.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
