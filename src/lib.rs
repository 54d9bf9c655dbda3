//! Gradebook - authentication and account lifecycle for an academic records system
//!
//! Students, lecturers and administrators sign in with email and password.
//! Self-registered accounts wait for admin approval; every state change lands
//! in an append-only audit trail.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Users, principals, password policy, audit events
//! - **services**: Lockout, authentication, authorization gate, account lifecycle, audit recorder
//! - **infra**: Database, migrations and repositories
//! - **api**: HTTP handlers, session guards, and routes
//! - **types**: Shared response envelopes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Bootstrap the first administrator
//! cargo run -- create-admin --email admin@example.edu --name Admin --password 'Ch4nge!me'
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{SessionPrincipal, User, UserRole};
pub use errors::{AppError, AppResult};
