//! Application route configuration.

use axum::{
    extract::State, http::StatusCode, middleware, response::Json, routing::get, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{admin_routes, auth_handler, auth_routes, course_routes};
use super::middleware::{require_admin, require_login};
use super::openapi::ApiDoc;
use super::session::session_lifetime;
use super::AppState;
use crate::config::PENDING_APPROVAL_PATH;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    // Anonymous sessions (flash only) expire on inactivity; login switches to an absolute deadline
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.session.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(session_lifetime(
            state.session.lifetime_hours,
        )));

    Router::new()
        // Health check endpoints
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Registration, login and own-account routes (guards applied per group)
        .nest("/auth", auth_routes(state.clone()))
        // Landing page for signed-in users whose approval is still pending
        .route(
            PENDING_APPROVAL_PATH,
            get(auth_handler::status).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_login,
            )),
        )
        // Administration (approved admin only)
        .nest(
            "/admin",
            admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_admin,
            )),
        )
        // Course routes evaluate ownership/enrollment in the handler
        .nest("/courses", course_routes())
        // Global middleware
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Gradebook API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint with database connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => match db.ping().await {
            Ok(_) => ServiceStatus {
                status: "healthy",
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                ServiceStatus {
                    status: "unhealthy",
                    error: Some("database unreachable".to_string()),
                }
            }
        },
        None => ServiceStatus {
            status: "unconfigured",
            error: None,
        },
    };

    let healthy = database.status != "unhealthy";
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        database,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
