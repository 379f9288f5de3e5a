//! HTTP protocol layer module
//!
//! Response building and MIME detection, decoupled from routing and
//! business logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_405_response, build_options_response,
    build_static_file_response, build_upload_error, build_upload_success,
};
