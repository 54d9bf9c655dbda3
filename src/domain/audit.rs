//! Audit trail types.
//!
//! Audit events are immutable records of state-changing actions. They are
//! appended only; nothing in this crate updates or deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of action being recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    UserRegistered,
    UserCreated,
    UserApproved,
    UserRejected,
    UserActivated,
    UserDeactivated,
    PasswordChanged,
    PasswordChangeFailed,
    ProfileUpdated,
    LoginSuccess,
    LoginFailed,
    LoginBlocked,
    Logout,
    /// Actions recorded by callers outside the lifecycle manager (course CRUD, results entry).
    Other(String),
}

impl AuditAction {
    pub fn label(&self) -> &str {
        match self {
            AuditAction::UserRegistered => "USER_REGISTERED",
            AuditAction::UserCreated => "USER_CREATED",
            AuditAction::UserApproved => "USER_APPROVED",
            AuditAction::UserRejected => "USER_REJECTED",
            AuditAction::UserActivated => "USER_ACTIVATED",
            AuditAction::UserDeactivated => "USER_DEACTIVATED",
            AuditAction::PasswordChanged => "PASSWORD_CHANGED",
            AuditAction::PasswordChangeFailed => "PASSWORD_CHANGE_FAILED",
            AuditAction::ProfileUpdated => "PROFILE_UPDATED",
            AuditAction::LoginSuccess => "LOGIN_SUCCESS",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::LoginBlocked => "LOGIN_BLOCKED",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Other(label) => label,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Network origin of the request that triggered an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestOrigin {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// An audit event waiting to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEvent {
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub record_id: Option<Uuid>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEvent {
    /// Start an event for `action` performed by `actor` (if resolved).
    pub fn new(actor: Option<Uuid>, action: AuditAction) -> Self {
        Self {
            user_id: actor,
            action,
            table_name: None,
            record_id: None,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    /// Name the affected table and record.
    pub fn on_record(mut self, table_name: impl Into<String>, record_id: Uuid) -> Self {
        self.table_name = Some(table_name.into());
        self.record_id = Some(record_id);
        self
    }

    pub fn before(mut self, snapshot: Value) -> Self {
        self.old_values = Some(snapshot);
        self
    }

    pub fn after(mut self, snapshot: Value) -> Self {
        self.new_values = Some(snapshot);
        self
    }

    pub fn from_origin(mut self, origin: &RequestOrigin) -> Self {
        self.ip_address = origin.ip_address.clone();
        self.user_agent = origin.user_agent.clone();
        self
    }
}

/// A persisted audit event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[schema(example = "USER_APPROVED")]
    pub action: String,
    #[schema(example = "users")]
    pub table_name: Option<String>,
    pub record_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub old_values: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
