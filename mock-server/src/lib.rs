use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, warn};

pub fn app() -> Router {
    Router::new()
        .route("/echo", get(echo_query).post(echo_body))
        .route("/headers", get(echo_headers).post(echo_headers))
        .route("/missing", get(missing).post(missing))
        .route("/status/{code}", get(with_status).post(with_status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Accept TCP connections and write every received chunk straight back.
pub async fn run_tcp_echo(listener: TcpListener) -> Result<(), std::io::Error> {
    loop {
        let (mut socket, peer) = listener.accept().await?;
        debug!(%peer, "echo client connected");
        tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Err(e) = socket.write_all(&buf[..n]).await {
                            warn!(%peer, error = %e, "echo write failed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(%peer, error = %e, "echo read failed");
                        break;
                    }
                }
            }
        });
    }
}

/// GET: the raw query string, without the leading `?`.
async fn echo_query(RawQuery(query): RawQuery) -> String {
    query.unwrap_or_default()
}

/// POST: the request body as text.
async fn echo_body(body: Bytes) -> String {
    String::from_utf8_lossy(&body).into_owned()
}

/// Request headers as a JSON object keyed by lowercase name.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let map = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(map)
}

async fn missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

async fn with_status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn echo_query_returns_raw_query() {
        let body = echo_query(RawQuery(Some("a=1&b=2".to_string()))).await;
        assert_eq!(body, "a=1&b=2");
    }

    #[tokio::test]
    async fn echo_query_without_query_is_empty() {
        assert_eq!(echo_query(RawQuery(None)).await, "");
    }

    #[tokio::test]
    async fn echo_body_decodes_utf8() {
        assert_eq!(echo_body(Bytes::from_static(b"a=1")).await, "a=1");
    }

    #[tokio::test]
    async fn echo_headers_lowercases_names() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Trace", HeaderValue::from_static("abc"));
        let Json(map) = echo_headers(headers).await;
        assert_eq!(map.get("x-trace").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn with_status_rejects_invalid_code() {
        let result = with_status(Path(1000)).await;
        assert_eq!(result.unwrap_err(), StatusCode::BAD_REQUEST);
    }
}
