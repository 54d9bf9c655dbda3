//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.
//!
//! DDD: Domain layer has NO infrastructure dependencies (except error types).
//! Contains: Entities, Value Objects, Domain Services.

pub mod audit;
pub mod notification;
pub mod password;
pub mod principal;
pub mod resource;
pub mod user;

pub use audit::{AuditAction, AuditEvent, NewAuditEvent, RequestOrigin};
pub use notification::NewNotification;
pub use password::{Argon2Credentials, CredentialVerifier, Password, PasswordRule, PasswordStrength};
pub use principal::SessionPrincipal;
pub use resource::{CourseRef, EnrollmentRef, EnrollmentStatus};
pub use user::{
    generate_student_id, normalize_email, ApprovalStatus, NewUser, User, UserPatch, UserResponse,
    UserRole,
};
