//! HTTP response building module
//!
//! Builders for the fixed-body responses the server sends, decoupled from the handler.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Build a response with a static body and the standard headers
///
/// If the configured header values are rejected by the builder, the error is
/// logged and the body is still sent with the same status and no extra headers.
pub fn build_static_response(
    status: StatusCode,
    body: &'static [u8],
    content_type: &str,
    server_name: &str,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", body.len())
        .header("Server", server_name)
        .body(Full::new(Bytes::from_static(body)))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut resp = Response::new(Full::new(Bytes::from_static(body)));
            *resp.status_mut() = status;
            resp
        })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!(
        "Failed to build {} response: {error}",
        status.as_u16()
    ));
}
