//! Account lifecycle service - registration, approval and activation.
//!
//! SOLID (SRP): Owns the pending -> approved/rejected and active/inactive
//! transitions; authentication lives in `auth_service`.
//! DDD: Orchestrates domain operations via Unit of Work.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::audit::AuditRecorder;
use super::credentials::{hash_password, verify_password};
use super::lockout::LockoutTracker;
use super::notifier::Notifier;
use crate::config::STUDENT_ID_MAX_ATTEMPTS;
use crate::domain::{
    generate_student_id, normalize_email, ApprovalStatus, AuditAction, CredentialVerifier,
    NewAuditEvent, NewUser, Password, PasswordStrength, RequestOrigin, User, UserPatch, UserRole,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

const USERS_TABLE: &str = "users";

/// Input for self-registration and admin-created accounts.
#[derive(Debug, Clone)]
pub struct AccountInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
}

/// Account lifecycle operations.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Self-registration. Creates a pending student or lecturer.
    async fn register(&self, input: AccountInput, origin: &RequestOrigin) -> AppResult<User>;

    /// Admin-created account of any role, approved immediately.
    async fn create_user(
        &self,
        admin_id: Uuid,
        input: AccountInput,
        origin: &RequestOrigin,
    ) -> AppResult<User>;

    /// Approve a user. Already-decided accounts are overwritten.
    async fn approve(&self, user_id: Uuid, admin_id: Uuid, origin: &RequestOrigin)
        -> AppResult<User>;

    /// Reject a user with a reason shown back to them.
    async fn reject(
        &self,
        user_id: Uuid,
        reason: String,
        admin_id: Uuid,
        origin: &RequestOrigin,
    ) -> AppResult<User>;

    /// Flip `is_active`, refusing to deactivate the last active admin.
    async fn toggle_active(
        &self,
        user_id: Uuid,
        requested_by: Uuid,
        origin: &RequestOrigin,
    ) -> AppResult<User>;

    /// Change password after re-verifying the current one.
    ///
    /// A wrong current password counts towards the login lockout.
    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        origin: &RequestOrigin,
    ) -> AppResult<()>;

    /// Edit the display name.
    async fn update_profile(&self, user_id: Uuid, name: String, origin: &RequestOrigin)
        -> AppResult<User>;

    async fn get_user(&self, user_id: Uuid) -> AppResult<User>;

    async fn list_pending(&self) -> AppResult<Vec<User>>;

    async fn list_by_role(&self, role: UserRole) -> AppResult<Vec<User>>;
}

/// Concrete implementation of AccountService using Unit of Work.
pub struct AccountManager<U: UnitOfWork> {
    uow: Arc<U>,
    verifier: Arc<dyn CredentialVerifier>,
    lockout: LockoutTracker,
    audit: AuditRecorder,
    notifier: Notifier,
}

impl<U: UnitOfWork> AccountManager<U> {
    pub fn new(
        uow: Arc<U>,
        verifier: Arc<dyn CredentialVerifier>,
        lockout: LockoutTracker,
        audit: AuditRecorder,
        notifier: Notifier,
    ) -> Self {
        Self {
            uow,
            verifier,
            lockout,
            audit,
            notifier,
        }
    }

    async fn find_user(&self, user_id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(user_id).await?.ok_or_not_found()
    }

    /// Shared checks and insert for both account creation paths.
    async fn create_account(
        &self,
        input: AccountInput,
        approval: Option<Uuid>,
    ) -> AppResult<User> {
        let name = validate_name(&input.name)?;

        let email = normalize_email(&input.email);
        let users = self.uow.users();
        if users.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }
        PasswordStrength::check(&input.password).into_result()?;

        let student_id = match input.role {
            UserRole::Student => Some(self.allocate_student_id().await?),
            UserRole::Admin | UserRole::Lecturer => None,
        };

        let password_hash = hash_password(&self.verifier, &input.password)
            .await?
            .into_string();

        let (approval_status, approved_by, approved_at) = match approval {
            Some(admin_id) => (ApprovalStatus::Approved, Some(admin_id), Some(Utc::now())),
            None => (ApprovalStatus::Pending, None, None),
        };

        // The unique index still guards against a concurrent registration
        users
            .insert(NewUser {
                email,
                password_hash,
                name,
                role: input.role,
                student_id,
                approval_status,
                approved_by,
                approved_at,
            })
            .await
    }

    /// Draw random student identifiers until one is free.
    async fn allocate_student_id(&self) -> AppResult<String> {
        let users = self.uow.users();
        for _ in 0..STUDENT_ID_MAX_ATTEMPTS {
            let candidate = generate_student_id(Utc::now());
            if users.find_by_student_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(%candidate, "Student identifier taken, retrying");
        }
        Err(AppError::internal("Could not allocate a free student identifier"))
    }

    /// Record a pending -> decided transition with status-only snapshots.
    fn record_decision(
        &self,
        action: AuditAction,
        admin_id: Uuid,
        before: &User,
        after: &User,
        origin: &RequestOrigin,
    ) {
        self.audit.record(
            NewAuditEvent::new(Some(admin_id), action)
                .on_record(USERS_TABLE, after.id)
                .before(json!({ "approval_status": before.approval_status.as_str() }))
                .after(json!({ "approval_status": after.approval_status.as_str() }))
                .from_origin(origin),
        );
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    Ok(name.to_string())
}

#[async_trait]
impl<U: UnitOfWork> AccountService for AccountManager<U> {
    async fn register(&self, input: AccountInput, origin: &RequestOrigin) -> AppResult<User> {
        if !input.role.is_self_registrable() {
            return Err(AppError::validation("Invalid role for registration"));
        }

        let user = self.create_account(input, None).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered, awaiting approval");

        self.notifier
            .notify_admins(
                "New registration",
                &format!(
                    "{} ({}) registered as {} and is awaiting approval",
                    user.name, user.email, user.role
                ),
            )
            .await;

        self.audit.record(
            NewAuditEvent::new(Some(user.id), AuditAction::UserRegistered)
                .on_record(USERS_TABLE, user.id)
                .after(json!({ "email": user.email, "role": user.role.as_str() }))
                .from_origin(origin),
        );

        Ok(user)
    }

    async fn create_user(
        &self,
        admin_id: Uuid,
        input: AccountInput,
        origin: &RequestOrigin,
    ) -> AppResult<User> {
        let user = self.create_account(input, Some(admin_id)).await?;
        tracing::info!(user_id = %user.id, %admin_id, role = %user.role, "User created by admin");

        self.audit.record(
            NewAuditEvent::new(Some(admin_id), AuditAction::UserCreated)
                .on_record(USERS_TABLE, user.id)
                .after(json!({ "email": user.email, "role": user.role.as_str() }))
                .from_origin(origin),
        );

        Ok(user)
    }

    async fn approve(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        origin: &RequestOrigin,
    ) -> AppResult<User> {
        let before = self.find_user(user_id).await?;

        let patch = UserPatch {
            approval_status: Some(ApprovalStatus::Approved),
            approved_by: Some(Some(admin_id)),
            approved_at: Some(Some(Utc::now())),
            rejection_reason: Some(None),
            ..Default::default()
        };
        let after = self.uow.users().update_partial(user_id, patch).await?;

        self.record_decision(AuditAction::UserApproved, admin_id, &before, &after, origin);
        tracing::info!(%user_id, %admin_id, "User approved");
        Ok(after)
    }

    async fn reject(
        &self,
        user_id: Uuid,
        reason: String,
        admin_id: Uuid,
        origin: &RequestOrigin,
    ) -> AppResult<User> {
        // Minimum length is enforced by the request validator
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("A rejection reason is required"));
        }

        let before = self.find_user(user_id).await?;

        // approved_by/approved_at record the reviewing admin for either outcome
        let patch = UserPatch {
            approval_status: Some(ApprovalStatus::Rejected),
            approved_by: Some(Some(admin_id)),
            approved_at: Some(Some(Utc::now())),
            rejection_reason: Some(Some(reason.to_string())),
            ..Default::default()
        };
        let after = self.uow.users().update_partial(user_id, patch).await?;

        self.record_decision(AuditAction::UserRejected, admin_id, &before, &after, origin);
        tracing::info!(%user_id, %admin_id, "User rejected");
        Ok(after)
    }

    async fn toggle_active(
        &self,
        user_id: Uuid,
        requested_by: Uuid,
        origin: &RequestOrigin,
    ) -> AppResult<User> {
        let users = self.uow.users();
        let before = self.find_user(user_id).await?;

        let (after, action) = if before.is_active {
            let after = users
                .deactivate_unless_last_admin(user_id)
                .await?
                .ok_or(AppError::LastAdminProtected)?;
            (after, AuditAction::UserDeactivated)
        } else {
            let patch = UserPatch {
                is_active: Some(true),
                ..Default::default()
            };
            (users.update_partial(user_id, patch).await?, AuditAction::UserActivated)
        };

        self.audit.record(
            NewAuditEvent::new(Some(requested_by), action)
                .on_record(USERS_TABLE, user_id)
                .before(json!({ "is_active": before.is_active }))
                .after(json!({ "is_active": after.is_active }))
                .from_origin(origin),
        );
        tracing::info!(%user_id, %requested_by, is_active = after.is_active, "User activation toggled");
        Ok(after)
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        origin: &RequestOrigin,
    ) -> AppResult<()> {
        let user = self.find_user(user_id).await?;
        let now = Utc::now();
        self.lockout.ensure_unlocked(&user, now)?;

        let stored = Password::from_hash(user.password_hash.clone());
        if !verify_password(&self.verifier, current_password, stored).await? {
            let users = self.uow.users();
            let outcome = self.lockout.record_failure(users.as_ref(), &user, now).await?;
            self.audit.record(
                NewAuditEvent::new(Some(user_id), AuditAction::PasswordChangeFailed)
                    .on_record(USERS_TABLE, user_id)
                    .after(json!({ "attempts": outcome.attempts, "locked": outcome.is_locked() }))
                    .from_origin(origin),
            );
            tracing::warn!(%user_id, attempts = outcome.attempts, "Password change with wrong current password");
            return Err(AppError::InvalidCredentials);
        }
        PasswordStrength::check(new_password).into_result()?;

        let password_hash = hash_password(&self.verifier, new_password)
            .await?
            .into_string();
        let patch = UserPatch {
            password_hash: Some(password_hash),
            ..Default::default()
        };
        self.uow.users().update_partial(user_id, patch).await?;

        // No payload: password material never goes into the audit log
        self.audit.record(
            NewAuditEvent::new(Some(user_id), AuditAction::PasswordChanged)
                .on_record(USERS_TABLE, user_id)
                .from_origin(origin),
        );
        tracing::info!(%user_id, "Password changed");
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        name: String,
        origin: &RequestOrigin,
    ) -> AppResult<User> {
        let name = validate_name(&name)?;
        let before = self.find_user(user_id).await?;

        let patch = UserPatch {
            name: Some(name),
            ..Default::default()
        };
        let after = self.uow.users().update_partial(user_id, patch).await?;

        self.audit.record(
            NewAuditEvent::new(Some(user_id), AuditAction::ProfileUpdated)
                .on_record(USERS_TABLE, user_id)
                .before(json!({ "name": before.name }))
                .after(json!({ "name": after.name }))
                .from_origin(origin),
        );
        Ok(after)
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        self.find_user(user_id).await
    }

    async fn list_pending(&self) -> AppResult<Vec<User>> {
        self.uow.users().list_pending().await
    }

    async fn list_by_role(&self, role: UserRole) -> AppResult<Vec<User>> {
        self.uow.users().list_by_role(role).await
    }
}
