//! Service Container - Centralized service access.
//!
//! SOLID (SRP): Manages service lifecycle and access.
//! SOLID (DIP): Depends on service traits, not implementations.

use std::sync::Arc;

use super::{
    AccountManager, AccountService, AuditRecorder, AuthService, Authenticator, Gate,
    LockoutPolicy, LockoutTracker, Notifier,
};
use crate::config::{Config, LockoutSettings};
use crate::domain::{Argon2Credentials, CredentialVerifier};
use crate::errors::AppResult;
use crate::infra::{Persistence, ResourceRepository, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get account lifecycle service
    fn accounts(&self) -> Arc<dyn AccountService>;

    /// Get authorization gate
    fn gate(&self) -> Gate;

    /// Get audit recorder
    fn audit(&self) -> AuditRecorder;

    /// Get course/enrollment lookups
    fn resources(&self) -> Arc<dyn ResourceRepository>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    account_service: Arc<dyn AccountService>,
    gate: Gate,
    audit: AuditRecorder,
    resources: Arc<dyn ResourceRepository>,
}

impl Services {
    /// Wire every service over one Unit of Work.
    ///
    /// Spawns the audit worker, so it must run inside a tokio runtime.
    pub fn new<U: UnitOfWork>(
        uow: Arc<U>,
        verifier: Arc<dyn CredentialVerifier>,
        lockout: &LockoutSettings,
    ) -> Self {
        let audit = AuditRecorder::spawn(uow.audit_logs());
        let notifier = Notifier::new(uow.users(), uow.notifications());
        let tracker = LockoutTracker::new(LockoutPolicy::from(lockout));

        Self {
            auth_service: Arc::new(Authenticator::new(
                uow.clone(),
                verifier.clone(),
                tracker,
                audit.clone(),
            )),
            account_service: Arc::new(AccountManager::new(
                uow.clone(),
                verifier,
                tracker,
                audit.clone(),
                notifier,
            )),
            gate: Gate::new(uow.resources()),
            audit,
            resources: uow.resources(),
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: &Config) -> AppResult<Self> {
        let verifier = Arc::new(Argon2Credentials::new(config.hashing)?);
        Ok(Self::new(
            Arc::new(Persistence::new(db)),
            verifier,
            &config.lockout,
        ))
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountService> {
        self.account_service.clone()
    }

    fn gate(&self) -> Gate {
        self.gate.clone()
    }

    fn audit(&self) -> AuditRecorder {
        self.audit.clone()
    }

    fn resources(&self) -> Arc<dyn ResourceRepository> {
        self.resources.clone()
    }
}
