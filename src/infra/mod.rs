//! Infrastructure layer - External systems integration
//!
//! - Database connection and migrations
//! - Repositories for users, courses, audit logs and notifications
//! - Unit of Work bundling repository access for the services

pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use repositories::{
    AuditRepository, AuditStore, NotificationRepository, NotificationStore, ResourceRepository,
    ResourceStore, UserRepository, UserStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockAuditRepository, MockNotificationRepository, MockResourceRepository, MockUserRepository,
};
