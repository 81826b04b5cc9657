//! HTTP protocol layer module
//!
//! Protocol helpers shared by the upload and retrieval handlers: response
//! builders, CORS, MIME inference, conditional and range requests.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeRequest};
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_416_response, build_image_response, build_json_response, build_preflight_response,
    build_text_response, HttpResponse, Validators,
};
