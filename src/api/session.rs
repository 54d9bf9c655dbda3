//! Server-side session helpers: principal storage and absolute expiry.

use tower_sessions::{Expiry, Session};

use crate::config::{
    DEFAULT_SESSION_LIFETIME_HOURS, MAX_SESSION_LIFETIME_HOURS, SESSION_KEY_PRINCIPAL,
};
use crate::domain::SessionPrincipal;
use crate::errors::{AppError, AppResult};

pub(crate) fn session_error(e: tower_sessions::session::Error) -> AppError {
    AppError::internal(format!("Session error: {}", e))
}

/// Configured session lifetime; non-positive settings use the default and
/// oversized ones are capped.
pub fn session_lifetime(lifetime_hours: i64) -> time::Duration {
    let hours = if lifetime_hours > 0 {
        lifetime_hours.min(MAX_SESSION_LIFETIME_HOURS)
    } else {
        DEFAULT_SESSION_LIFETIME_HOURS
    };
    time::Duration::hours(hours)
}

/// Deadline counted from now, not extended by activity.
pub fn absolute_expiry(lifetime_hours: i64) -> Expiry {
    Expiry::AtDateTime(time::OffsetDateTime::now_utc() + session_lifetime(lifetime_hours))
}

pub async fn current_principal(session: &Session) -> AppResult<Option<SessionPrincipal>> {
    session
        .get::<SessionPrincipal>(SESSION_KEY_PRINCIPAL)
        .await
        .map_err(session_error)
}

/// Begin an authenticated session under a fresh id.
pub async fn start(
    session: &Session,
    principal: &SessionPrincipal,
    lifetime_hours: i64,
) -> AppResult<()> {
    session.cycle_id().await.map_err(session_error)?;
    session.set_expiry(Some(absolute_expiry(lifetime_hours)));
    store_principal(session, principal).await
}

/// Overwrite the stored principal, keeping id and expiry.
pub async fn store_principal(session: &Session, principal: &SessionPrincipal) -> AppResult<()> {
    session
        .insert(SESSION_KEY_PRINCIPAL, principal)
        .await
        .map_err(session_error)
}

/// Drop all session data and the cookie.
pub async fn end(session: &Session) -> AppResult<()> {
    session.flush().await.map_err(session_error)
}
