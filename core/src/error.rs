//! Error types for request configuration, transports and the socket client.
//!
//! # Design
//! Configuration errors (`RequestError`) are returned synchronously to the
//! caller. Transport faults never reach the caller's thread: the dispatcher
//! folds them into a `FailedResponse`, which is the error half of an
//! `Outcome`. Socket errors keep the messages hosts already match on
//! (`"Socket is not initialized"`, `"Operation Timeout"`).

use std::io;

use thiserror::Error;

/// Errors returned while configuring a `WebRequest`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A parameter with this key was already added.
    #[error("parameter `{0}` is already set")]
    DuplicateParameter(String),

    /// A header override with this key was already set.
    #[error("header `{0}` is already set")]
    DuplicateHeader(String),
}

/// Faults raised by a `Transport` that carry no HTTP response.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The exchange could not be completed (DNS, connect, TLS, invalid URL).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The transport panicked while executing the request.
    #[error("transport panicked")]
    Panicked,
}

/// Failure payload delivered when a request does not succeed.
///
/// `status` is set when the fault carried a response (any non-2xx status);
/// `body` is that response's decoded body. Faults without a response have no
/// status and an empty body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("request failed (status {status:?}): {body}")]
pub struct FailedResponse {
    pub status: Option<u16>,
    pub body: String,
}

impl FailedResponse {
    /// A failure with neither status nor body.
    pub fn empty() -> Self {
        Self {
            status: None,
            body: String::new(),
        }
    }
}

/// Errors returned by `SocketClient` operations.
#[derive(Error, Debug)]
pub enum SocketError {
    /// The operation was attempted before `connect` succeeded or after `close`.
    #[error("Socket is not initialized")]
    NotConnected,

    /// The operation did not complete within the configured timeout.
    #[error("Operation Timeout")]
    Timeout,

    /// The host name resolved to no usable address.
    #[error("could not resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SocketError {
    /// Map an I/O error, folding the timeout kinds into `Timeout`.
    pub(crate) fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => SocketError::Timeout,
            _ => SocketError::Io(err),
        }
    }
}
