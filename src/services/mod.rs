//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion and reach storage through the Unit of Work.

mod account_service;
pub mod audit;
mod auth_service;
pub mod authorization;
pub mod container;
mod credentials;
pub mod lockout;
mod notifier;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use account_service::{AccountInput, AccountManager, AccountService};
pub use audit::AuditRecorder;
pub use auth_service::{AuthService, Authenticator};
pub use authorization::{Decision, Denial, Gate, Predicate, PredicateChain};
pub use lockout::{FailureOutcome, LockoutPolicy, LockoutTracker};
pub use notifier::Notifier;

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
