//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::User;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    #[sea_orm(unique)]
    pub student_id: Option<String>,
    pub approval_status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub is_active: bool,
    pub login_attempts: i32,
    pub locked_until: Option<DateTimeUtc>,
    pub last_login: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity.
///
/// An unknown role or status string is a data fault, never a default.
impl TryFrom<Model> for User {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse()
            .map_err(|_| AppError::internal(format!("Stored role is invalid for user {}", model.id)))?;
        let approval_status = model.approval_status.parse().map_err(|_| {
            AppError::internal(format!("Stored approval status is invalid for user {}", model.id))
        })?;

        Ok(User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            name: model.name,
            role,
            student_id: model.student_id,
            approval_status,
            approved_by: model.approved_by,
            approved_at: model.approved_at,
            rejection_reason: model.rejection_reason,
            is_active: model.is_active,
            login_attempts: model.login_attempts,
            locked_until: model.locked_until,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
