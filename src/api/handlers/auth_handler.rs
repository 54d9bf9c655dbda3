//! Authentication and own-account handlers.

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use tower_sessions::Session;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{ClientOrigin, ValidatedJson};
use crate::api::flash::{self, Flash};
use crate::api::middleware::{require_approved_user, require_login};
use crate::api::{session, AppState};
use crate::domain::{SessionPrincipal, UserResponse, UserRole};
use crate::errors::{AppError, AppResult};
use crate::services::AccountInput;
use crate::types::{ApiResponse, Created, MessageResponse};

/// Self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "student@example.edu")]
    pub email: String,
    /// Checked against the password strength policy
    #[schema(example = "Sup3r$ecret")]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// `student` or `lecturer`
    pub role: UserRole,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "student@example.edu")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "Sup3r$ecret")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    #[schema(example = "Ada King")]
    pub name: String,
}

/// Create authentication routes
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/flash", get(take_flash));

    let signed_in = Router::new()
        .route("/logout", post(logout))
        .route("/status", get(status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let approved = Router::new()
        .route("/password", put(change_password))
        .route("/profile", put(update_profile))
        .route_layer(middleware::from_fn_with_state(state, require_approved_user));

    public.merge(signed_in).merge(approved)
}

/// Register a new student or lecturer account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered, awaiting approval", body = UserResponse),
        (status = 400, description = "Validation error, weak password or admin role requested"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<UserResponse>> {
    let input = AccountInput {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        role: payload.role,
    };
    let user = state.account_service.register(input, &origin).await?;

    Ok(Created(UserResponse::from(user)))
}

/// Sign in and start a session
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = SessionPrincipal),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account deactivated"),
        (status = 423, description = "Account temporarily locked")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionPrincipal>>> {
    let principal = state
        .auth_service
        .authenticate(&payload.email, &payload.password, &origin)
        .await?;

    session::start(&session, &principal, state.session.lifetime_hours).await?;

    Ok(Json(ApiResponse::success(principal)))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<SessionPrincipal>,
    session: Session,
    ClientOrigin(origin): ClientOrigin,
) -> AppResult<Json<MessageResponse>> {
    state.auth_service.logout(&principal, &origin);
    session::end(&session).await?;

    Ok(Json(MessageResponse::new("Logged out")))
}

/// Current principal, re-read from storage
///
/// Pending users poll this to find out whether they have been approved.
#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "Authentication",
    responses(
        (status = 200, description = "Refreshed principal", body = SessionPrincipal),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Extension(principal): Extension<SessionPrincipal>,
    session: Session,
) -> AppResult<Json<ApiResponse<SessionPrincipal>>> {
    let refreshed = match state.auth_service.refresh_principal(principal.user_id).await {
        Ok(refreshed) => refreshed,
        Err(AppError::Unauthenticated) => {
            session::end(&session).await?;
            return Err(AppError::Unauthenticated);
        }
        Err(e) => return Err(e),
    };
    session::store_principal(&session, &refreshed).await?;

    Ok(Json(ApiResponse::success(refreshed)))
}

/// Drain queued flash messages
#[utoipa::path(
    get,
    path = "/auth/flash",
    tag = "Authentication",
    responses((status = 200, description = "Messages queued since the last call", body = [Flash]))
)]
pub async fn take_flash(session: Session) -> AppResult<Json<ApiResponse<Vec<Flash>>>> {
    let messages = flash::drain(&session).await?;
    Ok(Json(ApiResponse::success(messages)))
}

/// Change own password
#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "Account",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too weak"),
        (status = 401, description = "Current password incorrect")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<SessionPrincipal>,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .account_service
        .change_password(
            principal.user_id,
            &payload.current_password,
            &payload.new_password,
            &origin,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed")))
}

/// Update own display name
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "Account",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(mut principal): Extension<SessionPrincipal>,
    session: Session,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .account_service
        .update_profile(principal.user_id, payload.name, &origin)
        .await?;

    principal.refresh_from(&user);
    session::store_principal(&session, &principal).await?;

    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}
