//! In-app notifications.

use chrono::{DateTime, Utc};
use radapos_core::{NotificationId, NotificationKind};
use serde::Deserialize;
use tracing::instrument;

use super::{Ack, ApiClient, ApiError};

/// A notification for the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: bool,
    /// Preformatted display time, when the backend provides one.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Display time: the backend's label, or the creation timestamp.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.time.clone().unwrap_or_else(|| {
            self.created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        })
    }
}

/// Number of unread notifications in a list.
#[must_use]
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

impl ApiClient {
    /// Latest notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_json("/notifications/").await
    }

    /// Mark one notification as read.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<Ack, ApiError> {
        self.put_empty(&format!("/notifications/{id}/read")).await
    }

    /// Mark every notification as read.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn mark_all_notifications_read(&self) -> Result<Ack, ApiError> {
        self.put_empty("/notifications/mark-all-read").await
    }

    /// Delete every notification.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_notifications(&self) -> Result<Ack, ApiError> {
        self.delete("/notifications/clear").await
    }
}
