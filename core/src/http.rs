//! HTTP exchange types shared by the request builder and transports.
//!
//! # Design
//! Requests and responses are plain data. `WebRequest` prepares an
//! `HttpRequest`, a `Transport` turns it into an `HttpResponse`, and the
//! dispatcher classifies that response. Keeping the exchange as data lets
//! tests substitute an in-memory transport and lets the FFI layer stay thin.
//!
//! All fields use owned types (`String`, `Vec`) so values can move onto the
//! worker thread that runs the exchange.

use serde::{Deserialize, Serialize};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// For GET the serialized parameters are already part of `url` and `body` is
/// `None`. For POST `body` holds the serialized parameters, or `None` when
/// there were none to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// `body` is already decoded to text; invalid UTF-8 sequences are replaced
/// by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
