//! Session authentication guards.
//!
//! Each guard evaluates a predicate chain through the gate, then injects the
//! [`SessionPrincipal`] into the request extensions for handlers to read with
//! `Extension<SessionPrincipal>`.

use axum::{
    extract::{Request, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderMap, HeaderName,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::flash::{self, Flash, FlashLevel};
use crate::api::{session, AppState};
use crate::config::{HOME_PATH, LOGIN_PATH, PENDING_APPROVAL_PATH};
use crate::domain::SessionPrincipal;
use crate::errors::AppError;
use crate::services::{Decision, Denial, PredicateChain};

/// Failure of a guarded request.
#[derive(Debug)]
pub enum AuthRejection {
    /// The gate said no; `interactive` callers get a redirect instead of JSON
    Denied { denial: Denial, interactive: bool },
    Failed(AppError),
}

impl From<AppError> for AuthRejection {
    fn from(error: AppError) -> Self {
        AuthRejection::Failed(error)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Denied {
                denial,
                interactive: true,
            } => Redirect::to(recovery_path(denial)).into_response(),
            AuthRejection::Denied {
                denial,
                interactive: false,
            } => AppError::from(denial).into_response(),
            AuthRejection::Failed(error) => error.into_response(),
        }
    }
}

fn recovery_path(denial: Denial) -> &'static str {
    match denial {
        Denial::Unauthenticated => LOGIN_PATH,
        Denial::PendingApproval => PENDING_APPROVAL_PATH,
        Denial::Forbidden => HOME_PATH,
    }
}

fn recovery_flash(denial: Denial) -> Flash {
    match denial {
        Denial::Unauthenticated => Flash::new(FlashLevel::Warning, "Please log in to continue"),
        Denial::PendingApproval => Flash::new(
            FlashLevel::Info,
            "Your account is awaiting administrator approval",
        ),
        Denial::Forbidden => Flash::new(
            FlashLevel::Error,
            "You do not have permission to access that page",
        ),
    }
}

/// Programmatic callers get JSON; browsers get redirects.
pub fn wants_json(headers: &HeaderMap) -> bool {
    let mentions_json = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false)
    };
    let xhr = headers
        .get("X-Requested-With")
        .and_then(|h| h.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
        .unwrap_or(false);

    mentions_json(ACCEPT) || mentions_json(CONTENT_TYPE) || xhr
}

/// Evaluate `chain` for the session's principal.
///
/// On an interactive denial the recovery message is queued before returning.
pub async fn authorize_request(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    chain: &PredicateChain,
) -> Result<SessionPrincipal, AuthRejection> {
    let principal = session::current_principal(session).await?;

    let denial = match state.gate.authorize(principal.as_ref(), chain).await {
        Decision::Allow => match principal {
            Some(principal) => return Ok(principal),
            None => Denial::Unauthenticated,
        },
        Decision::Deny(denial) => denial,
    };

    let interactive = !wants_json(headers);
    if interactive {
        if let Err(e) = flash::push(session, recovery_flash(denial)).await {
            tracing::warn!(error = %e, "Failed to queue flash message");
        }
    }
    Err(AuthRejection::Denied {
        denial,
        interactive,
    })
}

async fn guard(
    state: &AppState,
    session: &Session,
    mut request: Request,
    next: Next,
    chain: PredicateChain,
) -> Response {
    match authorize_request(state, session, request.headers(), &chain).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Any signed-in user, approved or not.
pub async fn require_login(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    guard(&state, &session, request, next, PredicateChain::new()).await
}

/// Signed-in and approved (admins are always approved).
pub async fn require_approved_user(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    guard(&state, &session, request, next, PredicateChain::approved()).await
}

/// Signed-in admin.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    guard(&state, &session, request, next, PredicateChain::admin()).await
}
