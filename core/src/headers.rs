//! Header overrides and cache-defeating headers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Well-known request headers that can be overridden by enum key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestHeader {
    Accept,
    AcceptCharset,
    AcceptEncoding,
    AcceptLanguage,
    Authorization,
    CacheControl,
    Connection,
    ContentType,
    Cookie,
    IfModifiedSince,
    Pragma,
    Referer,
    UserAgent,
}

impl RequestHeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestHeader::Accept => "Accept",
            RequestHeader::AcceptCharset => "Accept-Charset",
            RequestHeader::AcceptEncoding => "Accept-Encoding",
            RequestHeader::AcceptLanguage => "Accept-Language",
            RequestHeader::Authorization => "Authorization",
            RequestHeader::CacheControl => "Cache-Control",
            RequestHeader::Connection => "Connection",
            RequestHeader::ContentType => "Content-Type",
            RequestHeader::Cookie => "Cookie",
            RequestHeader::IfModifiedSince => "If-Modified-Since",
            RequestHeader::Pragma => "Pragma",
            RequestHeader::Referer => "Referer",
            RequestHeader::UserAgent => "User-Agent",
        }
    }
}

/// Header overrides accumulated on a request before it is sent.
///
/// String keys and enum keys live in separate collections; each rejects a
/// repeated key. String keys compare exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    named: Vec<(String, String)>,
    known: Vec<(RequestHeader, String)>,
}

impl HeaderOverrides {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), RequestError> {
        let key = key.into();
        if self.named.iter().any(|(k, _)| *k == key) {
            return Err(RequestError::DuplicateHeader(key));
        }
        self.named.push((key, value.into()));
        Ok(())
    }

    pub fn set_known(&mut self, key: RequestHeader, value: impl Into<String>) -> Result<(), RequestError> {
        if self.known.iter().any(|(k, _)| *k == key) {
            return Err(RequestError::DuplicateHeader(key.as_str().to_string()));
        }
        self.known.push((key, value.into()));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.known.is_empty()
    }

    /// Write string-keyed overrides, then enum-keyed ones, into `headers`.
    pub fn apply(&self, headers: &mut Vec<(String, String)>) {
        for (key, value) in &self.named {
            set_header(headers, key, value);
        }
        for (key, value) in &self.known {
            set_header(headers, key.as_str(), value);
        }
    }
}

/// Set `name` to `value`, replacing any existing header of that name.
pub fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

/// Force a fresh response: `Cache-Control: no-cache` and
/// `If-Modified-Since` set to `now`.
pub fn apply_cache_busting(headers: &mut Vec<(String, String)>, now: DateTime<Utc>) {
    set_header(headers, RequestHeader::CacheControl.as_str(), "no-cache");
    set_header(headers, RequestHeader::IfModifiedSince.as_str(), &http_date(now));
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
