//! Admin-facing notifications.

use std::sync::Arc;

use crate::domain::{NewNotification, UserRole};
use crate::errors::AppResult;
use crate::infra::{NotificationRepository, UserRepository};

/// Fans a message out to every active administrator.
#[derive(Clone)]
pub struct Notifier {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl Notifier {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            users,
            notifications,
        }
    }

    /// Notify all active admins. Failures are logged, never returned.
    pub async fn notify_admins(&self, title: &str, message: &str) {
        if let Err(e) = self.try_notify_admins(title, message).await {
            tracing::warn!(error = %e, title, "Failed to notify administrators");
        }
    }

    async fn try_notify_admins(&self, title: &str, message: &str) -> AppResult<()> {
        let batch: Vec<NewNotification> = self
            .users
            .list_by_role(UserRole::Admin)
            .await?
            .into_iter()
            .filter(|admin| admin.is_active)
            .map(|admin| NewNotification {
                user_id: admin.id,
                title: title.to_string(),
                message: message.to_string(),
            })
            .collect();

        let count = batch.len();
        self.notifications.insert_many(batch).await?;
        tracing::debug!(count, "Administrators notified");
        Ok(())
    }
}
