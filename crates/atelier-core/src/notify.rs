//! Notification side channel.
//!
//! Mutating workshop calls announce themselves through a `NotificationSink`.
//! Delivery is best effort: `notify_best_effort` logs a failure and moves on,
//! so a broken notification endpoint never fails the primary operation.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::NewNotification;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> Result<()>;
}

/// `POST {base}/api/notifications`.
pub struct HttpNotificationSink {
    client: reqwest::Client,
    url: String,
}

impl HttpNotificationSink {
    pub fn new(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            url: config.notifications_url(),
        }
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    async fn create(&self, notification: &NewNotification) -> Result<()> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http("create notification", status, None));
        }
        Ok(())
    }
}

/// Sink that drops every notification.
pub struct NoopNotificationSink;

#[async_trait]
impl NotificationSink for NoopNotificationSink {
    async fn create(&self, _notification: &NewNotification) -> Result<()> {
        Ok(())
    }
}

pub async fn notify_best_effort(sink: &dyn NotificationSink, notification: NewNotification) {
    match sink.create(&notification).await {
        Ok(()) => tracing::debug!(
            "[Notify] {} sent to {}",
            notification.kind.as_str(),
            notification.user_id
        ),
        Err(e) => tracing::warn!(
            "[Notify] failed to send {} to {}: {}",
            notification.kind.as_str(),
            notification.user_id,
            e
        ),
    }
}
