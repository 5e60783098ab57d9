//! The network seam: anything that can execute an `HttpRequest`.
//!
//! # Design
//! `Transport::execute` is synchronous. The dispatcher already moves every
//! exchange off the caller's thread, so implementations may block freely.
//! A non-2xx status is a normal `Ok(HttpResponse)`; only faults that produce
//! no response at all are `Err`.

use tracing::debug;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a `ureq` agent.
///
/// Status codes are returned as data (`http_status_as_error(false)`) so the
/// dispatcher can hand error bodies to the caller.
/// Exceeding `max_redirects` returns the last 3xx rather than failing, and
/// bodies are read up to `TransportConfig::max_body_size` (unbounded by
/// default, instead of ureq's 10 MB).
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_size: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_config(&TransportConfig::default())
    }

    pub fn with_config(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .max_redirects(config.max_redirects)
            .max_redirects_will_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            max_body_size: config.max_body_size,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let result = match method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&url);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&url);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| TransportError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        debug!(%url, status, "response received");

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body_size)
            .read_to_vec()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
