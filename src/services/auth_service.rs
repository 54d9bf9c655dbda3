//! Authentication service - turns credentials into a session principal.
//!
//! SOLID (SRP): Handles authentication concerns only.
//! DDD: Password work is delegated to the `CredentialVerifier` seam.
//! DDD: Uses Unit of Work for repository access.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::audit::AuditRecorder;
use super::credentials::{verify_against_dummy, verify_password};
use super::lockout::LockoutTracker;
use crate::domain::{
    normalize_email, AuditAction, CredentialVerifier, NewAuditEvent, Password, RequestOrigin,
    SessionPrincipal,
};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and produce the principal to store in the session.
    ///
    /// Every call records exactly one audit event: `LOGIN_SUCCESS`,
    /// `LOGIN_FAILED` or `LOGIN_BLOCKED`.
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        origin: &RequestOrigin,
    ) -> AppResult<SessionPrincipal>;

    /// Record an explicit logout. The caller discards the session.
    fn logout(&self, principal: &SessionPrincipal, origin: &RequestOrigin);

    /// Re-read the user behind a session, e.g. to pick up a pending approval.
    async fn refresh_principal(&self, user_id: Uuid) -> AppResult<SessionPrincipal>;
}

/// Outcome of the credential checks, with whatever user they resolved to.
struct LoginAttempt {
    user_id: Option<Uuid>,
    outcome: AppResult<SessionPrincipal>,
}

impl LoginAttempt {
    fn failed(user_id: Option<Uuid>, error: AppError) -> Self {
        Self {
            user_id,
            outcome: Err(error),
        }
    }
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    verifier: Arc<dyn CredentialVerifier>,
    lockout: LockoutTracker,
    audit: AuditRecorder,
    dummy_hash: Arc<OnceCell<Password>>,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(
        uow: Arc<U>,
        verifier: Arc<dyn CredentialVerifier>,
        lockout: LockoutTracker,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            uow,
            verifier,
            lockout,
            audit,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn attempt(&self, email: &str, password: &str) -> LoginAttempt {
        let users = self.uow.users();

        let user = match users.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                // Same cost and same error as a wrong password
                if let Err(e) = verify_against_dummy(&self.verifier, &self.dummy_hash, password).await {
                    return LoginAttempt::failed(None, e);
                }
                return LoginAttempt::failed(None, AppError::InvalidCredentials);
            }
            Err(e) => return LoginAttempt::failed(None, e),
        };
        let user_id = Some(user.id);
        let now = Utc::now();

        if let Err(e) = self.lockout.ensure_unlocked(&user, now) {
            return LoginAttempt::failed(user_id, e);
        }

        let stored = Password::from_hash(user.password_hash.clone());
        match verify_password(&self.verifier, password, stored).await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(e) = self.lockout.record_failure(users.as_ref(), &user, now).await {
                    return LoginAttempt::failed(user_id, e);
                }
                return LoginAttempt::failed(user_id, AppError::InvalidCredentials);
            }
            Err(e) => return LoginAttempt::failed(user_id, e),
        }

        if !user.is_active {
            return LoginAttempt::failed(user_id, AppError::AccountDeactivated);
        }

        let outcome = self
            .lockout
            .record_success(users.as_ref(), user.id, now)
            .await
            .map(|refreshed| SessionPrincipal::from(&refreshed));

        LoginAttempt { user_id, outcome }
    }
}

fn login_event(email: &str, attempt: &LoginAttempt) -> NewAuditEvent {
    let (action, details) = match &attempt.outcome {
        Ok(principal) => (
            AuditAction::LoginSuccess,
            json!({ "role": principal.role.as_str() }),
        ),
        Err(AppError::AccountLocked { minutes_remaining }) => (
            AuditAction::LoginBlocked,
            json!({ "email": email, "reason": "locked", "minutes_remaining": minutes_remaining }),
        ),
        Err(AppError::AccountDeactivated) => (
            AuditAction::LoginBlocked,
            json!({ "email": email, "reason": "deactivated" }),
        ),
        Err(e) => (
            AuditAction::LoginFailed,
            json!({ "email": email, "reason": e.code() }),
        ),
    };

    let event = NewAuditEvent::new(attempt.user_id, action).after(details);
    match attempt.user_id {
        Some(id) => event.on_record("users", id),
        None => event,
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        origin: &RequestOrigin,
    ) -> AppResult<SessionPrincipal> {
        let email = normalize_email(email);
        let attempt = self.attempt(&email, password).await;

        self.audit
            .record(login_event(&email, &attempt).from_origin(origin));

        match &attempt.outcome {
            Ok(principal) => {
                tracing::info!(user_id = %principal.user_id, role = %principal.role, "User logged in")
            }
            Err(e) if e.is_infrastructure() => {
                tracing::error!(error = %e, "Login failed on infrastructure error")
            }
            Err(e) => tracing::info!(user_id = ?attempt.user_id, code = e.code(), "Login rejected"),
        }

        attempt.outcome
    }

    fn logout(&self, principal: &SessionPrincipal, origin: &RequestOrigin) {
        self.audit.record(
            NewAuditEvent::new(Some(principal.user_id), AuditAction::Logout)
                .on_record("users", principal.user_id)
                .from_origin(origin),
        );
        tracing::info!(user_id = %principal.user_id, "User logged out");
    }

    async fn refresh_principal(&self, user_id: Uuid) -> AppResult<SessionPrincipal> {
        self.uow
            .users()
            .find_by_id(user_id)
            .await?
            .map(|user| SessionPrincipal::from(&user))
            .ok_or(AppError::Unauthenticated)
    }
}
