//! HTTP request handlers.

pub mod admin_handler;
pub mod auth_handler;
pub mod course_handler;

pub use admin_handler::admin_routes;
pub use auth_handler::auth_routes;
pub use course_handler::course_routes;
