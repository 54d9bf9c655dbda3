//! API middleware.

mod auth;

pub use auth::{
    authorize_request, require_admin, require_approved_user, require_login, wants_json,
    AuthRejection,
};
