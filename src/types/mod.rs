//! Shared response envelopes.

mod response;

pub use response::{ApiResponse, Created, MessageResponse};
