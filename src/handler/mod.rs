//! Request handler module
//!
//! Routing dispatch plus the upload, retrieval and health endpoints.

pub mod health;
pub mod images;
pub mod router;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
