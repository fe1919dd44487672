//! services/api/src/adapters/notifier.rs
//!
//! A `NotificationService` that writes outgoing messages to the log instead
//! of a mail server.

use async_trait::async_trait;
use duotrack_core::domain::Notification;
use duotrack_core::ports::{NotificationService, PortResult};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationAdapter;

#[async_trait]
impl NotificationService for LogNotificationAdapter {
    async fn send(&self, notification: Notification) -> PortResult<()> {
        info!(
            to = %notification.recipient_email,
            subject = %notification.subject,
            bytes = notification.html_body.len(),
            "Notification queued for delivery"
        );
        Ok(())
    }
}
