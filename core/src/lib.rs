//! Asynchronous web-request and TCP socket helpers for host applications.
//!
//! # Overview
//! `WebRequest` collects a URL, a method, parameters and header overrides,
//! then `begin` sends it exactly once without blocking the caller. The
//! outcome arrives either through a `PendingResponse` (awaitable, or
//! `wait()` from a plain thread) or through a success/error callback pair.
//! `SocketClient` is a small blocking TCP client with per-operation timeouts.
//!
//! # Design
//! - The exchange is plain data (`HttpRequest` / `HttpResponse`); the
//!   `Transport` trait is the only place that touches the network, and
//!   `UreqTransport` is the default implementation.
//! - Parameters are encoded as `key=value` pairs joined by `&` unless a
//!   serializer hook replaces that encoding.
//! - Transport faults never reach the caller's thread; they resolve the
//!   request with a `FailedResponse`.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod http;
pub mod params;
pub mod request;
pub mod socket;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{SocketConfig, TransportConfig};
pub use dispatch::{Outcome, PendingResponse};
pub use error::{FailedResponse, RequestError, SocketError, TransportError};
pub use headers::RequestHeader;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{json_serializer, Parameters, Serializer};
pub use request::WebRequest;
pub use socket::SocketClient;
pub use transport::{Transport, UreqTransport};
