//! C-ABI wrapper around `netkit-core`.
//!
//! # Overview
//! Exposes `WebRequest` and `SocketClient` through `extern "C"` functions so
//! a mobile host can configure and send requests, and drive a TCP client,
//! without linking against Rust types directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Request configuration returns an `FfiStatus`; `netkit_request_begin`
//!   reports the outcome through C callbacks on a worker thread, exactly one
//!   of them exactly once.
//! - Socket operations return an `FfiSocketResult` envelope carrying a code
//!   and a text payload.
//! - The C caller owns all returned pointers and must call the matching
//!   `netkit_*_free` function to release them.

pub mod types;

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use netkit_core::{SocketClient, SocketConfig, Transport, UreqTransport, WebRequest};

use types::*;

/// Success callback for `netkit_request_begin`. `body` is only valid for the
/// duration of the call.
pub type FfiSuccessCallback = extern "C" fn(user_data: *mut c_void, body: *const c_char);

/// Error callback for `netkit_request_begin`. `status` is 0 when the failure
/// carried no response; `body` is only valid for the duration of the call.
pub type FfiErrorCallback = extern "C" fn(user_data: *mut c_void, status: u16, body: *const c_char);

// ---------------------------------------------------------------------------
// Request lifecycle
// ---------------------------------------------------------------------------

/// Create a request for `url`.
///
/// Returns null if `url` is null or not UTF-8, or if an internal panic occurs.
/// The caller must free the returned pointer with `netkit_request_free`.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_new(url: *const c_char, method: FfiHttpMethod) -> *mut FfiWebRequest {
    catch_unwind(|| {
        let url = match unsafe { read_str(url) } {
            Ok(url) => url,
            Err(_) => return std::ptr::null_mut(),
        };
        let request = WebRequest::new(url, method.into());
        Box::into_raw(Box::new(FfiWebRequest { inner: Some(request) }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a request created by `netkit_request_new`. Safe to call with null,
/// and after `netkit_request_begin`.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_free(request: *mut FfiWebRequest) {
    if !request.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(request) });
        }));
    }
}

/// Run `f` on the unsent request behind `request`.
fn with_request<F>(request: *mut FfiWebRequest, f: F) -> FfiStatus
where
    F: FnOnce(&mut WebRequest) -> FfiStatus,
{
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() {
            return FfiStatus::NullArg;
        }
        let handle = unsafe { &mut *request };
        match handle.inner.as_mut() {
            Some(inner) => f(inner),
            None => FfiStatus::AlreadySent,
        }
    }))
    .unwrap_or(FfiStatus::Panic)
}

// ---------------------------------------------------------------------------
// Request configuration
// ---------------------------------------------------------------------------

/// Add a string parameter. Returns `Duplicate` if `key` was already added.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_add_parameter(
    request: *mut FfiWebRequest,
    key: *const c_char,
    value: *const c_char,
) -> FfiStatus {
    with_request(request, |inner| {
        let (key, value) = match unsafe { (read_str(key), read_str(value)) } {
            (Ok(k), Ok(v)) => (k, v),
            (Err(e), _) | (_, Err(e)) => return e.into(),
        };
        match inner.add_parameter(key, value) {
            Ok(()) => FfiStatus::Ok,
            Err(e) => e.into(),
        }
    })
}

/// Remove every parameter added so far.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_clear_parameters(request: *mut FfiWebRequest) -> FfiStatus {
    with_request(request, |inner| {
        inner.clear_parameters();
        FfiStatus::Ok
    })
}

/// Set a header override. Returns `Duplicate` if `key` was already set.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_set_header(
    request: *mut FfiWebRequest,
    key: *const c_char,
    value: *const c_char,
) -> FfiStatus {
    with_request(request, |inner| {
        let (key, value) = match unsafe { (read_str(key), read_str(value)) } {
            (Ok(k), Ok(v)) => (k, v),
            (Err(e), _) | (_, Err(e)) => return e.into(),
        };
        match inner.set_header_param(key, value) {
            Ok(()) => FfiStatus::Ok,
            Err(e) => e.into(),
        }
    })
}

/// Set the content type sent with POST bodies.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_set_content_type(
    request: *mut FfiWebRequest,
    content_type: *const c_char,
) -> FfiStatus {
    with_request(request, |inner| match unsafe { read_str(content_type) } {
        Ok(content_type) => {
            inner.set_content_type(content_type);
            FfiStatus::Ok
        }
        Err(e) => e.into(),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_set_cache_enabled(request: *mut FfiWebRequest, enabled: bool) -> FfiStatus {
    with_request(request, |inner| {
        inner.set_cache_enabled(enabled);
        FfiStatus::Ok
    })
}

/// Send the request without blocking.
///
/// Exactly one of `on_success` / `on_error` is later called once, on a worker
/// thread, with `user_data`. Either callback may be null to ignore that
/// outcome. The handle is spent afterwards: further configuration calls
/// return `AlreadySent`, and it must still be freed.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_request_begin(
    request: *mut FfiWebRequest,
    on_success: Option<FfiSuccessCallback>,
    on_error: Option<FfiErrorCallback>,
    user_data: *mut c_void,
) -> FfiStatus {
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() {
            return FfiStatus::NullArg;
        }
        let handle = unsafe { &mut *request };
        let Some(inner) = handle.inner.take() else {
            return FfiStatus::AlreadySent;
        };

        let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new());
        let success_data = UserData(user_data);
        let error_data = UserData(user_data);
        inner.begin_with(
            transport,
            move |body| {
                if let Some(callback) = on_success {
                    let body = to_c_string(&body);
                    callback(success_data.get(), body.as_ptr());
                }
            },
            move |failed| {
                if let Some(callback) = on_error {
                    let body = to_c_string(&failed.body);
                    callback(error_data.get(), failed.status.unwrap_or(0), body.as_ptr());
                }
            },
        );
        FfiStatus::Ok
    }))
    .unwrap_or(FfiStatus::Panic)
}

// ---------------------------------------------------------------------------
// Socket client
// ---------------------------------------------------------------------------

/// Create a socket client. Zero for either argument keeps the default
/// (5000 ms timeout, 2048-byte receive buffer).
///
/// The caller must free the returned pointer with `netkit_socket_free`.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_socket_new(timeout_ms: u32, max_buffer_size: u32) -> *mut FfiSocketClient {
    catch_unwind(|| {
        let config = SocketConfig::new()
            .with_timeout(Duration::from_millis(u64::from(timeout_ms)))
            .with_max_buffer_size(max_buffer_size as usize);
        let client = SocketClient::with_config(config);
        Box::into_raw(Box::new(FfiSocketClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Close and free a socket client. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_socket_free(client: *mut FfiSocketClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

/// Run `f` on the socket client behind `client`.
fn with_socket<F>(client: *mut FfiSocketClient, name: &str, f: F) -> *mut FfiSocketResult
where
    F: FnOnce(&mut SocketClient) -> *mut FfiSocketResult,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiSocketResult::new(FfiSocketCode::NullArg, "null argument: client");
        }
        f(&mut unsafe { &mut *client }.inner)
    }))
    .unwrap_or_else(|_| FfiSocketResult::new(FfiSocketCode::Panic, &format!("panic in {name}")))
}

/// Connect to `host:port`. On success `text` is `"Success"`.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_socket_connect(
    client: *mut FfiSocketClient,
    host: *const c_char,
    port: u16,
) -> *mut FfiSocketResult {
    with_socket(client, "netkit_socket_connect", |inner| {
        let host = match unsafe { read_str(host) } {
            Ok(host) => host,
            Err(e) => return FfiSocketResult::new(e.into(), "invalid argument: host"),
        };
        match inner.connect(host, port) {
            Ok(()) => FfiSocketResult::ok("Success"),
            Err(e) => FfiSocketResult::from_error(e),
        }
    })
}

/// Send `data`. On success `text` is `"Success"`.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_socket_send(client: *mut FfiSocketClient, data: *const c_char) -> *mut FfiSocketResult {
    with_socket(client, "netkit_socket_send", |inner| {
        let data = match unsafe { read_str(data) } {
            Ok(data) => data,
            Err(e) => return FfiSocketResult::new(e.into(), "invalid argument: data"),
        };
        match inner.send(data) {
            Ok(_) => FfiSocketResult::ok("Success"),
            Err(e) => FfiSocketResult::from_error(e),
        }
    })
}

/// Receive one chunk. With `timeout` false, waits until data arrives or the
/// peer closes. On success `text` is the received data.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_socket_receive(client: *mut FfiSocketClient, timeout: bool) -> *mut FfiSocketResult {
    with_socket(client, "netkit_socket_receive", |inner| {
        let received = if timeout {
            inner.receive()
        } else {
            inner.receive_without_timeout()
        };
        match received {
            Ok(data) => FfiSocketResult::ok(&data),
            Err(e) => FfiSocketResult::from_error(e),
        }
    })
}

/// Close the connection; the client may connect again afterwards.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_socket_close(client: *mut FfiSocketClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            unsafe { &mut *client }.inner.close();
        }));
    }
}

/// Free an `FfiSocketResult` returned by any `netkit_socket_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn netkit_free_socket_result(result: *mut FfiSocketResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.text.is_null() {
            drop(unsafe { CString::from_raw(result.text) });
        }
    }));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
