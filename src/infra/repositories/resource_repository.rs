//! Course and enrollment lookups used by ownership and membership checks.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entities::{
    course::Entity as CourseEntity,
    enrollment::{self, Entity as EnrollmentEntity},
};
use crate::domain::{CourseRef, EnrollmentRef, EnrollmentStatus};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Resource store exposing only owner/participant fields.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Find a course by ID
    async fn find_course_by_id(&self, id: Uuid) -> AppResult<Option<CourseRef>>;

    /// List the enrollments of a student that are currently active
    async fn list_active_enrollments_for_student(
        &self,
        student_id: Uuid,
    ) -> AppResult<Vec<EnrollmentRef>>;
}

/// Concrete implementation of ResourceRepository
pub struct ResourceStore {
    db: DatabaseConnection,
}

impl ResourceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResourceRepository for ResourceStore {
    async fn find_course_by_id(&self, id: Uuid) -> AppResult<Option<CourseRef>> {
        let result = CourseEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(CourseRef::from))
    }

    async fn list_active_enrollments_for_student(
        &self,
        student_id: Uuid,
    ) -> AppResult<Vec<EnrollmentRef>> {
        let models = EnrollmentEntity::find()
            .filter(enrollment::Column::StudentId.eq(student_id))
            .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active.as_str()))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(EnrollmentRef::try_from).collect()
    }
}
