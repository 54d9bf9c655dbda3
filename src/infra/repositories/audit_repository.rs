//! Append-only audit log storage.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use super::entities::audit_log::{self, ActiveModel, Entity as AuditLogEntity};
use crate::domain::{AuditEvent, NewAuditEvent};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Audit store. There is deliberately no update or delete operation.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persist one event
    async fn append(&self, event: NewAuditEvent) -> AppResult<()>;

    /// Most recent events first
    async fn list_recent(&self, limit: u64) -> AppResult<Vec<AuditEvent>>;
}

/// Concrete implementation of AuditRepository
pub struct AuditStore {
    db: DatabaseConnection,
}

impl AuditStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditRepository for AuditStore {
    async fn append(&self, event: NewAuditEvent) -> AppResult<()> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(event.user_id),
            action: Set(event.action.label().to_string()),
            table_name: Set(event.table_name),
            record_id: Set(event.record_id),
            old_values: Set(event.old_values),
            new_values: Set(event.new_values),
            ip_address: Set(event.ip_address),
            user_agent: Set(event.user_agent),
            created_at: Set(event.created_at),
        };

        active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn list_recent(&self, limit: u64) -> AppResult<Vec<AuditEvent>> {
        let models = AuditLogEntity::find()
            .order_by_desc(audit_log::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(AuditEvent::from).collect())
    }
}
