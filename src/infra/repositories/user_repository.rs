//! User repository implementation.
//!
//! Every write is field-scoped: only columns named in a [`UserPatch`] are sent
//! to the database, so concurrent unrelated edits never clobber each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, AccessMode, ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait,
    DatabaseConnection, DbErr, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter,
    QueryOrder, RuntimeErr, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::config::DB_SERIALIZABLE_ATTEMPTS;
use crate::domain::{ApprovalStatus, NewUser, User, UserPatch, UserRole};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User store operations consumed by the authentication and lifecycle services.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by (already normalized) email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by generated student identifier
    async fn find_by_student_id(&self, student_id: &str) -> AppResult<Option<User>>;

    /// Insert a new user record
    async fn insert(&self, user: NewUser) -> AppResult<User>;

    /// Update only the fields present in `patch`
    async fn update_partial(&self, id: Uuid, patch: UserPatch) -> AppResult<User>;

    /// Atomically add one to the failed-login counter, returning the new value
    async fn increment_login_attempts(&self, id: Uuid) -> AppResult<i32>;

    /// Start a new failure window on an expired lock: counter to 1, lock cleared.
    ///
    /// Only applies while `locked_until` still equals `expired_lock`; returns
    /// `None` when another request already restarted the window.
    async fn restart_login_window(
        &self,
        id: Uuid,
        expired_lock: DateTime<Utc>,
    ) -> AppResult<Option<i32>>;

    /// Deactivate a user unless doing so would leave no active admin.
    ///
    /// Returns `None` (and writes nothing) when the user is the last active admin.
    async fn deactivate_unless_last_admin(&self, id: Uuid) -> AppResult<Option<User>>;

    /// List users holding `role`
    async fn list_by_role(&self, role: UserRole) -> AppResult<Vec<User>>;

    /// List users awaiting approval, oldest first
    async fn list_pending(&self) -> AppResult<Vec<User>>;

    /// Count active users holding `role`
    async fn count_active_by_role(&self, role: UserRole) -> AppResult<u64>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// One SERIALIZABLE attempt: two concurrent deactivations cannot both see
    /// "2 admins left". The loser fails with a serialization error on Postgres.
    async fn try_deactivate(&self, id: Uuid) -> Result<Deactivation, DbErr> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), Some(AccessMode::ReadWrite))
            .await?;

        let target = match UserEntity::find_by_id(id).one(&txn).await? {
            Some(model) => model,
            None => {
                txn.rollback().await?;
                return Ok(Deactivation::Missing);
            }
        };

        if target.role == UserRole::Admin.as_str() && target.is_active {
            let active_admins = UserEntity::find()
                .filter(user::Column::Role.eq(UserRole::Admin.as_str()))
                .filter(user::Column::IsActive.eq(true))
                .count(&txn)
                .await?;

            if active_admins <= 1 {
                txn.rollback().await?;
                return Ok(Deactivation::LastAdmin);
            }
        }

        let patch = UserPatch {
            is_active: Some(false),
            ..Default::default()
        };
        let model = match patch_model(id, patch).update(&txn).await {
            Ok(model) => model,
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                return Err(e);
            }
        };
        txn.commit().await?;

        Ok(Deactivation::Done(model))
    }
}

fn to_users(models: Vec<user::Model>) -> AppResult<Vec<User>> {
    models.into_iter().map(User::try_from).collect()
}

/// Translate a unique-constraint violation on insert into a domain error.
fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("email") => {
            AppError::DuplicateEmail
        }
        _ => AppError::from(err),
    }
}

/// Postgres SQLSTATE 40001: the transaction lost a serialization conflict.
fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == "40001"),
        _ => false,
    }
}

/// Outcome of one deactivation transaction.
enum Deactivation {
    Missing,
    LastAdmin,
    Done(user::Model),
}

fn map_update_error(err: DbErr) -> AppError {
    match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => AppError::NotFound,
        other => AppError::from(other),
    }
}

/// Build an update model carrying only the patched columns.
fn patch_model(id: Uuid, patch: UserPatch) -> ActiveModel {
    let mut active = ActiveModel {
        id: Unchanged(id),
        ..Default::default()
    };

    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(hash) = patch.password_hash {
        active.password_hash = Set(hash);
    }
    if let Some(status) = patch.approval_status {
        active.approval_status = Set(status.as_str().to_string());
    }
    if let Some(approved_by) = patch.approved_by {
        active.approved_by = Set(approved_by);
    }
    if let Some(approved_at) = patch.approved_at {
        active.approved_at = Set(approved_at);
    }
    if let Some(reason) = patch.rejection_reason {
        active.rejection_reason = Set(reason);
    }
    if let Some(is_active) = patch.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(attempts) = patch.login_attempts {
        active.login_attempts = Set(attempts);
    }
    if let Some(locked_until) = patch.locked_until {
        active.locked_until = Set(locked_until);
    }
    if let Some(last_login) = patch.last_login {
        active.last_login = Set(last_login);
    }
    active.updated_at = Set(Utc::now());

    active
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_student_id(&self, student_id: &str) -> AppResult<Option<User>> {
        UserEntity::find()
            .filter(user::Column::StudentId.eq(student_id))
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            role: Set(new_user.role.as_str().to_string()),
            student_id: Set(new_user.student_id),
            approval_status: Set(new_user.approval_status.as_str().to_string()),
            approved_by: Set(new_user.approved_by),
            approved_at: Set(new_user.approved_at),
            rejection_reason: Set(None),
            is_active: Set(true),
            login_attempts: Set(0),
            locked_until: Set(None),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(map_insert_error)?;
        User::try_from(model)
    }

    async fn update_partial(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let model = patch_model(id, patch)
            .update(&self.db)
            .await
            .map_err(map_update_error)?;
        User::try_from(model)
    }

    async fn increment_login_attempts(&self, id: Uuid) -> AppResult<i32> {
        // Single UPDATE so concurrent failures never lose an increment
        let updated = UserEntity::update_many()
            .col_expr(
                user::Column::LoginAttempts,
                Expr::col(user::Column::LoginAttempts).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await?;

        updated
            .first()
            .map(|model| model.login_attempts)
            .ok_or(AppError::NotFound)
    }

    async fn restart_login_window(
        &self,
        id: Uuid,
        expired_lock: DateTime<Utc>,
    ) -> AppResult<Option<i32>> {
        let updated = UserEntity::update_many()
            .col_expr(user::Column::LoginAttempts, Expr::value(1))
            .col_expr(
                user::Column::LockedUntil,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::LockedUntil.eq(expired_lock))
            .exec_with_returning(&self.db)
            .await?;

        Ok(updated.first().map(|model| model.login_attempts))
    }

    async fn deactivate_unless_last_admin(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut attempt = 1;
        let outcome = loop {
            match self.try_deactivate(id).await {
                Err(e) if is_serialization_failure(&e) && attempt < DB_SERIALIZABLE_ATTEMPTS => {
                    tracing::debug!(user_id = %id, attempt, "Deactivation lost a serialization conflict, retrying");
                    attempt += 1;
                }
                other => break other.map_err(map_update_error)?,
            }
        };

        match outcome {
            Deactivation::Missing => Err(AppError::NotFound),
            Deactivation::LastAdmin => Ok(None),
            Deactivation::Done(model) => User::try_from(model).map(Some),
        }
    }

    async fn list_by_role(&self, role: UserRole) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::Role.eq(role.as_str()))
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await?;
        to_users(models)
    }

    async fn list_pending(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::ApprovalStatus.eq(ApprovalStatus::Pending.as_str()))
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        to_users(models)
    }

    async fn count_active_by_role(&self, role: UserRole) -> AppResult<u64> {
        UserEntity::find()
            .filter(user::Column::Role.eq(role.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }
}
