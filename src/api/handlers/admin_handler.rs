//! Administrator handlers: approvals, activation and audit log.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{ClientOrigin, ValidatedJson};
use crate::api::AppState;
use crate::config::DEFAULT_AUDIT_PAGE_SIZE;
use crate::domain::{AuditEvent, SessionPrincipal, User, UserResponse, UserRole};
use crate::errors::AppResult;
use crate::services::AccountInput;
use crate::types::{ApiResponse, Created};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    /// Role to list
    pub role: UserRole,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Maximum number of events, newest first
    pub limit: Option<u64>,
}

/// Admin-created account
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "lecturer@example.edu")]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectRequest {
    #[validate(length(min = 10, message = "Rejection reason must be at least 10 characters"))]
    #[schema(example = "Could not verify enrollment documents", min_length = 10)]
    pub reason: String,
}

/// Create admin routes. The caller applies the admin guard.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/pending", get(list_pending))
        .route("/users/:id/approve", post(approve_user))
        .route("/users/:id/reject", post(reject_user))
        .route("/users/:id/toggle-active", post(toggle_active))
        .route("/audit-logs", get(list_audit_logs))
}

fn responses(users: Vec<User>) -> Vec<UserResponse> {
    users.into_iter().map(UserResponse::from).collect()
}

/// Accounts awaiting approval, oldest first
#[utoipa::path(
    get,
    path = "/admin/users/pending",
    tag = "Admin",
    responses(
        (status = 200, description = "Pending accounts", body = [UserResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_pending(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = state.account_service.list_pending().await?;
    Ok(Json(ApiResponse::success(responses(users))))
}

/// Accounts holding a role
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    params(RoleQuery),
    responses(
        (status = 200, description = "Accounts with the role", body = [UserResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = state.account_service.list_by_role(query.role).await?;
    Ok(Json(ApiResponse::success(responses(users))))
}

/// Create an approved account of any role
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "Admin",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error or weak password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<SessionPrincipal>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<Created<UserResponse>> {
    let input = AccountInput {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        role: payload.role,
    };
    let user = state
        .account_service
        .create_user(admin.user_id, input, &origin)
        .await?;

    Ok(Created(UserResponse::from(user)))
}

/// Approve an account
#[utoipa::path(
    post,
    path = "/admin/users/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account approved", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(admin): Extension<SessionPrincipal>,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .account_service
        .approve(id, admin.user_id, &origin)
        .await?;
    Ok(Json(ApiResponse::with_message(
        UserResponse::from(user),
        "User approved",
    )))
}

/// Reject an account with a reason
#[utoipa::path(
    post,
    path = "/admin/users/{id}/reject",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Account rejected", body = UserResponse),
        (status = 400, description = "Reason missing or too short"),
        (status = 404, description = "User not found")
    )
)]
pub async fn reject_user(
    State(state): State<AppState>,
    Extension(admin): Extension<SessionPrincipal>,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejectRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .account_service
        .reject(id, payload.reason, admin.user_id, &origin)
        .await?;
    Ok(Json(ApiResponse::with_message(
        UserResponse::from(user),
        "User rejected",
    )))
}

/// Activate or deactivate an account
#[utoipa::path(
    post,
    path = "/admin/users/{id}/toggle-active",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active flag flipped", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Would leave no active administrator")
    )
)]
pub async fn toggle_active(
    State(state): State<AppState>,
    Extension(admin): Extension<SessionPrincipal>,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .account_service
        .toggle_active(id, admin.user_id, &origin)
        .await?;
    let message = if user.is_active {
        "User activated"
    } else {
        "User deactivated"
    };
    Ok(Json(ApiResponse::with_message(UserResponse::from(user), message)))
}

/// Recent audit events
#[utoipa::path(
    get,
    path = "/admin/audit-logs",
    tag = "Admin",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit events, newest first", body = [AuditEvent]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<ApiResponse<Vec<AuditEvent>>>> {
    let events = state
        .audit
        .recent(query.limit.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE))
        .await?;
    Ok(Json(ApiResponse::success(events)))
}
