//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod audit_log;
pub mod course;
pub mod enrollment;
pub mod notification;
pub mod user;
