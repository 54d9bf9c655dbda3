//! User domain entity and related types.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    ROLE_ADMIN, ROLE_LECTURER, ROLE_STUDENT, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED,
    STUDENT_ID_PREFIX,
};
use crate::errors::AppError;

/// User roles enumeration. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Lecturer,
    Student,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Lecturer => ROLE_LECTURER,
            UserRole::Student => ROLE_STUDENT,
        }
    }

    /// Roles that may be chosen at self-registration.
    pub fn is_self_registrable(&self) -> bool {
        match self {
            UserRole::Admin => false,
            UserRole::Lecturer | UserRole::Student => true,
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(UserRole::Admin),
            ROLE_LECTURER => Ok(UserRole::Lecturer),
            ROLE_STUDENT => Ok(UserRole::Student),
            other => Err(AppError::validation(format!("Unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval gate, independent of role and of the active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => STATUS_PENDING,
            ApprovalStatus::Approved => STATUS_APPROVED,
            ApprovalStatus::Rejected => STATUS_REJECTED,
        }
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_PENDING => Ok(ApprovalStatus::Pending),
            STATUS_APPROVED => Ok(ApprovalStatus::Approved),
            STATUS_REJECTED => Ok(ApprovalStatus::Rejected),
            other => Err(AppError::validation(format!("Unknown approval status: {}", other))),
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub student_id: Option<String>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub login_attempts: i32,
    #[serde(skip_serializing)]
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True when a lock is set and has not yet expired at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if now < until)
    }
}

/// Data needed to insert a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub student_id: Option<String>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Field-scoped update. `None` leaves a column untouched; `Some(None)` writes NULL.
///
/// Role is deliberately absent: it never changes after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub approved_by: Option<Option<Uuid>>,
    pub approved_at: Option<Option<DateTime<Utc>>>,
    pub rejection_reason: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub login_attempts: Option<i32>,
    pub locked_until: Option<Option<DateTime<Utc>>>,
    pub last_login: Option<Option<DateTime<Utc>>>,
}

/// Lower-case and trim an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generate a student identifier: prefix, 4-digit year, 4-digit zero-padded random number.
pub fn generate_student_id(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{:04}{:04}", STUDENT_ID_PREFIX, now.year(), suffix)
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "student@example.edu")]
    pub email: String,
    /// User display name
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// User role
    pub role: UserRole,
    /// Generated for students only
    #[schema(example = "STU20260042")]
    pub student_id: Option<String>,
    /// Approval status
    pub approval_status: ApprovalStatus,
    /// Present only when rejected
    pub rejection_reason: Option<String>,
    /// Whether the account may sign in
    pub is_active: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            student_id: user.student_id,
            approval_status: user.approval_status,
            rejection_reason: user.rejection_reason,
            is_active: user.is_active,
            approved_at: user.approved_at,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
