//! Session principal - the identity attached to an authenticated session.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{ApprovalStatus, User, UserRole};

/// Authenticated identity held server-side for the lifetime of a session.
///
/// Excludes the password hash, failed-login counter and lock timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionPrincipal {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub student_id: Option<String>,
}

impl SessionPrincipal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Copy the fields that may change during a session (profile, approval).
    pub fn refresh_from(&mut self, user: &User) {
        self.email = user.email.clone();
        self.name = user.name.clone();
        self.approval_status = user.approval_status;
        self.student_id = user.student_id.clone();
    }
}

impl From<&User> for SessionPrincipal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            approval_status: user.approval_status,
            student_id: user.student_id.clone(),
        }
    }
}
