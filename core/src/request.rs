//! Configurable one-shot web request.
//!
//! # Design
//! `WebRequest` collects parameters, header overrides, a content type, a
//! cache toggle and an optional serializer hook. `prepare` turns that state
//! into a plain `HttpRequest`; `begin` and `begin_with` take the request by
//! value, prepare it and hand it to the dispatcher. Because `begin` consumes
//! `self`, a request is sent at most once and its parameters cannot change
//! after it has been sent.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::dispatch::{launch, PendingResponse};
use crate::error::{FailedResponse, RequestError};
use crate::headers::{apply_cache_busting, set_header, HeaderOverrides, RequestHeader};
use crate::http::{HttpMethod, HttpRequest};
use crate::params::{encode_body, encode_query, Parameters, Serializer};
use crate::transport::Transport;

/// A GET or POST request that has not been sent yet.
pub struct WebRequest {
    url: String,
    method: HttpMethod,
    parameters: Parameters,
    content_type: String,
    cache_enabled: bool,
    serializer: Option<Serializer>,
    headers: HeaderOverrides,
}

impl WebRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self::with_parameters(url, method, Parameters::new(), "")
    }

    pub fn with_parameters(url: &str, method: HttpMethod, parameters: Parameters, content_type: &str) -> Self {
        Self {
            url: url.to_string(),
            method,
            parameters,
            content_type: content_type.to_string(),
            cache_enabled: false,
            serializer: None,
            headers: HeaderOverrides::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Content type sent with POST bodies. Empty means no `Content-Type`.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// When disabled (the default) every request carries
    /// `Cache-Control: no-cache` and a fresh `If-Modified-Since`.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Replace the default `key=value` encoding for this request.
    pub fn set_serializer<F>(&mut self, serializer: F)
    where
        F: Fn(&Parameters) -> String + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
    }

    /// Use a shared serializer hook, e.g. `params::json_serializer()`.
    pub fn set_shared_serializer(&mut self, serializer: Serializer) {
        self.serializer = Some(serializer);
    }

    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), RequestError> {
        self.parameters.insert(key, value)
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn set_header_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), RequestError> {
        self.headers.set(key, value)
    }

    pub fn set_known_header(&mut self, key: RequestHeader, value: impl Into<String>) -> Result<(), RequestError> {
        self.headers.set_known(key, value)
    }

    /// Build the exchange that `begin` would send right now.
    pub fn prepare(&self) -> HttpRequest {
        self.prepare_at(Utc::now())
    }

    pub(crate) fn prepare_at(&self, now: DateTime<Utc>) -> HttpRequest {
        let mut headers = Vec::new();
        self.headers.apply(&mut headers);
        if !self.cache_enabled {
            apply_cache_busting(&mut headers, now);
        }

        let payload = self.serialize();
        match self.method {
            HttpMethod::Get => HttpRequest {
                method: HttpMethod::Get,
                url: format!("{}{}", self.url, payload.unwrap_or_default()),
                headers,
                body: None,
            },
            HttpMethod::Post => {
                if !self.content_type.is_empty() {
                    set_header(&mut headers, RequestHeader::ContentType.as_str(), &self.content_type);
                }
                HttpRequest {
                    method: HttpMethod::Post,
                    url: self.url.clone(),
                    headers,
                    body: payload,
                }
            }
        }
    }

    /// Serialized parameters, or `None` when there are none. The hook is
    /// only consulted for a non-empty set.
    fn serialize(&self) -> Option<String> {
        if self.parameters.is_empty() {
            return None;
        }
        let encoded = match (&self.serializer, self.method) {
            (Some(serializer), _) => serializer(&self.parameters),
            (None, HttpMethod::Get) => encode_query(&self.parameters),
            (None, HttpMethod::Post) => encode_body(&self.parameters),
        };
        Some(encoded)
    }

    /// Send the request without blocking and return a handle to its outcome.
    pub fn begin(self, transport: Arc<dyn Transport>) -> PendingResponse {
        PendingResponse::spawn(self.prepare(), transport)
    }

    /// Send the request without blocking; exactly one of the callbacks runs,
    /// once, on the worker that executed the exchange.
    pub fn begin_with<S, E>(self, transport: Arc<dyn Transport>, on_success: S, on_error: E)
    where
        S: FnOnce(String) + Send + 'static,
        E: FnOnce(FailedResponse) + Send + 'static,
    {
        launch(self.prepare(), transport, move |outcome| match outcome {
            Ok(body) => on_success(body),
            Err(failed) => on_error(failed),
        });
    }
}

impl fmt::Debug for WebRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebRequest")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("parameters", &self.parameters)
            .field("content_type", &self.content_type)
            .field("cache_enabled", &self.cache_enabled)
            .field("custom_serializer", &self.serializer.is_some())
            .field("headers", &self.headers)
            .finish()
    }
}
