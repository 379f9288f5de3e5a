//! Request handler module
//!
//! Routing dispatch and business logic: the avatar upload endpoint and
//! static file serving for everything else.

pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
