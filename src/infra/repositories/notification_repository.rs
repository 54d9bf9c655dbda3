//! Notification storage.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use super::entities::notification::{ActiveModel, Entity as NotificationEntity};
use crate::domain::NewNotification;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a batch of notifications
    async fn insert_many(&self, notifications: Vec<NewNotification>) -> AppResult<()>;
}

/// Concrete implementation of NotificationRepository
pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn insert_many(&self, notifications: Vec<NewNotification>) -> AppResult<()> {
        if notifications.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let models = notifications.into_iter().map(|n| ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(n.user_id),
            title: Set(n.title),
            message: Set(n.message),
            is_read: Set(false),
            created_at: Set(now),
        });

        NotificationEntity::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
