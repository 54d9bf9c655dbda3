//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::flash::{Flash, FlashLevel};
use crate::api::handlers::{admin_handler, auth_handler, course_handler};
use crate::domain::{ApprovalStatus, AuditEvent, CourseRef, SessionPrincipal, UserResponse, UserRole};
use crate::types::MessageResponse;

/// OpenAPI documentation for the gradebook service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gradebook",
        version = "0.1.0",
        description = "Academic records: accounts, approvals, role and ownership checks, audit trail"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::logout,
        auth_handler::status,
        auth_handler::take_flash,
        auth_handler::change_password,
        auth_handler::update_profile,
        // Admin endpoints
        admin_handler::list_pending,
        admin_handler::list_users,
        admin_handler::create_user,
        admin_handler::approve_user,
        admin_handler::reject_user,
        admin_handler::toggle_active,
        admin_handler::list_audit_logs,
        // Course endpoints
        course_handler::manage_course,
        course_handler::course_overview,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            ApprovalStatus,
            UserResponse,
            SessionPrincipal,
            AuditEvent,
            CourseRef,
            // Request types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::ChangePasswordRequest,
            auth_handler::UpdateProfileRequest,
            admin_handler::CreateUserRequest,
            admin_handler::RejectRequest,
            // Shared
            MessageResponse,
            Flash,
            FlashLevel,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and sessions"),
        (name = "Account", description = "Own-account changes"),
        (name = "Admin", description = "Approvals, activation and audit log"),
        (name = "Courses", description = "Ownership- and enrollment-gated course access")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for the session cookie
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session cookie set by /auth/login",
                ))),
            );
        }
    }
}
