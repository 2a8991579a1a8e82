//! HTTP surface of the document Q&A service.
//!
//! Exposes upload, query, statistics and clear operations of
//! [`ragbot_knowledge::RagService`] as a JSON API.

pub mod errors;
pub mod handlers;
pub mod router;
pub mod state;

pub use errors::ApiError;
pub use router::router;
pub use state::AppState;
