//! Course handlers gated on ownership and enrollment.
//!
//! The chains here depend on the path parameter, so they are evaluated in
//! the handler rather than in a route layer.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{authorize_request, AuthRejection};
use crate::api::AppState;
use crate::domain::{CourseRef, UserRole};
use crate::errors::OptionExt;
use crate::services::PredicateChain;
use crate::types::ApiResponse;

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/manage", get(manage_course))
        .route("/:id/overview", get(course_overview))
}

async fn load_course(state: &AppState, course_id: Uuid) -> Result<CourseRef, AuthRejection> {
    Ok(state
        .resources
        .find_course_by_id(course_id)
        .await?
        .ok_or_not_found()?)
}

/// Course management view for its lecturer (or an admin)
#[utoipa::path(
    get,
    path = "/courses/{id}/manage",
    tag = "Courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course record", body = CourseRef),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not approved, or not the course lecturer")
    )
)]
pub async fn manage_course(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CourseRef>>, AuthRejection> {
    let chain = PredicateChain::approved()
        .roles(&[UserRole::Admin, UserRole::Lecturer])
        .owns_course(course_id);
    authorize_request(&state, &session, &headers, &chain).await?;

    let course = load_course(&state, course_id).await?;
    Ok(Json(ApiResponse::success(course)))
}

/// Course overview for enrolled students, lecturers and admins
#[utoipa::path(
    get,
    path = "/courses/{id}/overview",
    tag = "Courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course record", body = CourseRef),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not approved, or not enrolled")
    )
)]
pub async fn course_overview(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CourseRef>>, AuthRejection> {
    let chain = PredicateChain::approved().enrolled_in(course_id);
    authorize_request(&state, &session, &headers, &chain).await?;

    let course = load_course(&state, course_id).await?;
    Ok(Json(ApiResponse::success(course)))
}
