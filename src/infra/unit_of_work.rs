//! Unit of Work - centralized repository access.
//!
//! SOLID (DIP): Services depend on this trait, not on sea-orm.
//! Multi-statement atomicity lives inside the repository methods that need it
//! (see `UserRepository::deactivate_unless_last_admin`).

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    AuditRepository, AuditStore, NotificationRepository, NotificationStore, ResourceRepository,
    ResourceStore, UserRepository, UserStore,
};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync + 'static {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get course/enrollment repository
    fn resources(&self) -> Arc<dyn ResourceRepository>;

    /// Get audit log repository
    fn audit_logs(&self) -> Arc<dyn AuditRepository>;

    /// Get notification repository
    fn notifications(&self) -> Arc<dyn NotificationRepository>;
}

/// Concrete implementation of UnitOfWork backed by one database connection pool
pub struct Persistence {
    user_repo: Arc<UserStore>,
    resource_repo: Arc<ResourceStore>,
    audit_repo: Arc<AuditStore>,
    notification_repo: Arc<NotificationStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            resource_repo: Arc::new(ResourceStore::new(db.clone())),
            audit_repo: Arc::new(AuditStore::new(db.clone())),
            notification_repo: Arc::new(NotificationStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn resources(&self) -> Arc<dyn ResourceRepository> {
        self.resource_repo.clone()
    }

    fn audit_logs(&self) -> Arc<dyn AuditRepository> {
        self.audit_repo.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notification_repo.clone()
    }
}
