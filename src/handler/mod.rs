//! Request handler module
//!
//! The greeter and the entry point hyper calls for every request.

pub mod greeter;
pub mod request;

// Re-export main entry point
pub use greeter::StaticGreeter;
pub use request::handle_request;
