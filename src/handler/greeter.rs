//! Static greeting handler
//!
//! Answers every request with `200 OK` and the body `Hello World!\n`.
//! Method, path, headers and body of the request are never inspected.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use crate::config::HttpConfig;
use crate::http;

/// The response body, byte for byte
pub const GREETING: &[u8] = b"Hello World!\n";

/// Stateless responder; holds only header values fixed at startup
#[derive(Debug, Clone)]
pub struct StaticGreeter {
    content_type: String,
    server_name: String,
}

impl StaticGreeter {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            content_type: config.content_type.clone(),
            server_name: config.server_name.clone(),
        }
    }

    /// Build the greeting. The request is accepted only to fit the
    /// handler shape; its body is never polled.
    pub fn respond<B>(&self, _req: &Request<B>) -> Response<Full<Bytes>> {
        http::build_static_response(
            StatusCode::OK,
            GREETING,
            &self.content_type,
            &self.server_name,
        )
    }
}
