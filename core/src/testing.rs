//! In-memory transports for unit tests.

use std::sync::Mutex;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

pub(crate) fn get_request(url: &str) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Get,
        url: url.to_string(),
        headers: Vec::new(),
        body: None,
    }
}

/// Answers every request with the same response and records what it saw.
pub(crate) struct FixedTransport {
    response: Option<HttpResponse>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl FixedTransport {
    pub(crate) fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self {
            response: Some(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fails every request as if the host were unreachable.
    pub(crate) fn unreachable() -> Self {
        Self {
            response: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Transport for FixedTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        self.response
            .clone()
            .ok_or_else(|| TransportError::Connection("host unreachable".to_string()))
    }
}

pub(crate) struct PanickingTransport;

impl Transport for PanickingTransport {
    fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        panic!("transport exploded");
    }
}
