//! Owner/participant views of courses and enrollments.
//!
//! The full course, assessment and result records belong to the CRUD side of
//! the application; authorization only needs who owns or attends what.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ENROLLMENT_ACTIVE, ENROLLMENT_COMPLETED, ENROLLMENT_DROPPED};
use crate::errors::AppError;

/// Course reference with its owning lecturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseRef {
    pub id: Uuid,
    #[schema(example = "CS101")]
    pub code: String,
    #[schema(example = "Introduction to Programming")]
    pub title: String,
    pub lecturer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Dropped,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => ENROLLMENT_ACTIVE,
            EnrollmentStatus::Dropped => ENROLLMENT_DROPPED,
            EnrollmentStatus::Completed => ENROLLMENT_COMPLETED,
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ENROLLMENT_ACTIVE => Ok(EnrollmentStatus::Active),
            ENROLLMENT_DROPPED => Ok(EnrollmentStatus::Dropped),
            ENROLLMENT_COMPLETED => Ok(EnrollmentStatus::Completed),
            other => Err(AppError::validation(format!("Unknown enrollment status: {}", other))),
        }
    }
}

/// Enrollment reference linking a student user to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRef {
    pub id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub status: EnrollmentStatus,
}
