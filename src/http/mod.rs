//! HTTP protocol layer module
//!
//! Response building shared by the handler, kept apart from the greeting itself.

pub mod response;

pub use response::build_static_response;
