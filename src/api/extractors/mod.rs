//! Custom request extractors.

mod origin;
mod validated_json;

pub use origin::ClientOrigin;
pub use validated_json::ValidatedJson;
