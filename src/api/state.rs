//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Database, ResourceRepository};
use crate::services::{
    AccountService, AuditRecorder, AuthService, Gate, ServiceContainer, Services,
};

/// Cookie and lifetime settings for the session layer.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub lifetime_hours: i64,
    pub secure_cookie: bool,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            lifetime_hours: config.session_lifetime_hours,
            secure_cookie: config.session_secure_cookie,
        }
    }
}

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// Account lifecycle service
    pub account_service: Arc<dyn AccountService>,
    /// Authorization gate
    pub gate: Gate,
    /// Audit recorder
    pub audit: AuditRecorder,
    /// Course and enrollment lookups
    pub resources: Arc<dyn ResourceRepository>,
    /// Database handle for health checks; absent when wired over test stores
    pub database: Option<Arc<Database>>,
    pub session: SessionSettings,
}

impl AppState {
    /// Create application state from database connection and config.
    ///
    /// Spawns the audit worker, so it must run inside a tokio runtime.
    pub fn from_config(database: Arc<Database>, config: &Config) -> AppResult<Self> {
        let services = Services::from_connection(database.get_connection(), config)?;
        Ok(Self::new(&services, Some(database), SessionSettings::from(config)))
    }

    /// Create application state from any service container.
    pub fn new(
        services: &dyn ServiceContainer,
        database: Option<Arc<Database>>,
        session: SessionSettings,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            account_service: services.accounts(),
            gate: services.gate(),
            audit: services.audit(),
            resources: services.resources(),
            database,
            session,
        }
    }
}
