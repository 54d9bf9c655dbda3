//! In-app notifications addressed to a single user.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
}
