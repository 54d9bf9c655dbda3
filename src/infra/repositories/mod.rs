//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod audit_repository;
pub(crate) mod entities;
mod notification_repository;
mod resource_repository;
mod user_repository;

pub use audit_repository::{AuditRepository, AuditStore};
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use resource_repository::{ResourceRepository, ResourceStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests
#[cfg(any(test, feature = "test-utils"))]
pub use audit_repository::MockAuditRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotificationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use resource_repository::MockResourceRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
