//! Enrollment database entity.

use sea_orm::entity::prelude::*;

use crate::domain::EnrollmentRef;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
    pub enrolled_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for EnrollmentRef {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(EnrollmentRef {
            id: model.id,
            course_id: model.course_id,
            student_id: model.student_id,
            status: model.status.parse().map_err(|_| {
                AppError::internal(format!("Stored status is invalid for enrollment {}", model.id))
            })?,
        })
    }
}
