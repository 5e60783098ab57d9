//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Opaque handles wrap the core types; status enums have explicit
//! discriminants; strings handed to C are NUL-free `CString`s. Conversion
//! helpers live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use netkit_core::{HttpMethod, RequestError, SocketClient, SocketError, WebRequest};

/// Opaque handle to a `WebRequest`. `inner` is taken by
/// `netkit_request_begin`, after which the handle only accepts `free`.
pub struct FfiWebRequest {
    pub(crate) inner: Option<WebRequest>,
}

/// Opaque handle to a `SocketClient`.
pub struct FfiSocketClient {
    pub(crate) inner: SocketClient,
}

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
        }
    }
}

/// Status returned by request configuration functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatus {
    Ok = 0,
    NullArg = 1,
    InvalidUtf8 = 2,
    Duplicate = 3,
    AlreadySent = 4,
    Panic = 5,
}

impl From<RequestError> for FfiStatus {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::DuplicateParameter(_) | RequestError::DuplicateHeader(_) => FfiStatus::Duplicate,
        }
    }
}

/// Caller context handed back to the callbacks on the worker thread.
pub(crate) struct UserData(pub(crate) *mut c_void);

impl UserData {
    pub(crate) fn get(&self) -> *mut c_void {
        self.0
    }
}

// The C caller promises `user_data` may be used from the worker thread.
unsafe impl Send for UserData {}

// ---------------------------------------------------------------------------
// Socket results
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiSocketResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSocketCode {
    Ok = 0,
    NotConnected = 1,
    Timeout = 2,
    Io = 3,
    NullArg = 4,
    InvalidUtf8 = 5,
    Panic = 6,
}

/// Result envelope for socket operations.
///
/// `text` holds the received data (receive), `"Success"` (connect, send) or
/// the error message. The caller frees it with `netkit_free_socket_result`.
#[repr(C)]
pub struct FfiSocketResult {
    pub code: FfiSocketCode,
    pub text: *mut c_char,
}

impl FfiSocketResult {
    pub(crate) fn ok(text: &str) -> *mut Self {
        Self::new(FfiSocketCode::Ok, text)
    }

    pub(crate) fn from_error(err: SocketError) -> *mut Self {
        let code = match &err {
            SocketError::NotConnected => FfiSocketCode::NotConnected,
            SocketError::Timeout => FfiSocketCode::Timeout,
            SocketError::Resolve { .. } | SocketError::Io(_) => FfiSocketCode::Io,
        };
        Self::new(code, &err.to_string())
    }

    pub(crate) fn new(code: FfiSocketCode, text: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiSocketResult {
            code,
            text: to_c_string(text).into_raw(),
        }))
    }
}

// ---------------------------------------------------------------------------
// String helpers
// ---------------------------------------------------------------------------

/// Why a C string argument could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgError {
    Null,
    InvalidUtf8,
}

impl From<ArgError> for FfiStatus {
    fn from(err: ArgError) -> Self {
        match err {
            ArgError::Null => FfiStatus::NullArg,
            ArgError::InvalidUtf8 => FfiStatus::InvalidUtf8,
        }
    }
}

impl From<ArgError> for FfiSocketCode {
    fn from(err: ArgError) -> Self {
        match err {
            ArgError::Null => FfiSocketCode::NullArg,
            ArgError::InvalidUtf8 => FfiSocketCode::InvalidUtf8,
        }
    }
}

/// Borrow a C string argument as `&str`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Result<&'a str, ArgError> {
    if ptr.is_null() {
        return Err(ArgError::Null);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| ArgError::InvalidUtf8)
}

/// Convert to a `CString`, dropping interior NULs.
pub(crate) fn to_c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}
