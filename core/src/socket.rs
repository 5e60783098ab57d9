//! Blocking TCP client with per-operation timeouts.
//!
//! # Design
//! Each operation blocks the caller for at most `SocketConfig::timeout`.
//! All state lives in the instance and every operation takes `&mut self`,
//! so one client cannot be driven from two threads at once and separate
//! clients never share a wait primitive.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::SocketConfig;
use crate::error::SocketError;

#[derive(Debug, Default)]
pub struct SocketClient {
    config: SocketConfig,
    stream: Option<TcpStream>,
}

impl SocketClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero fields in `config` fall back to their defaults.
    pub fn with_config(config: SocketConfig) -> Self {
        Self {
            config: config.normalized(),
            stream: None,
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Connect to `host:port`, trying each resolved address in turn.
    ///
    /// Name resolution and every attempt share one deadline of
    /// `config.timeout`. Any previous connection is dropped first.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), SocketError> {
        self.stream = None;
        let deadline = Instant::now() + self.config.timeout;
        let addrs = resolve(host, port, self.config.timeout)?;
        if addrs.is_empty() {
            return Err(SocketError::Resolve {
                host: host.to_string(),
                port,
            });
        }
        self.stream = Some(connect_any(&addrs, deadline)?);
        Ok(())
    }

    /// Send the UTF-8 bytes of `data`, returning how many were written.
    pub fn send(&mut self, data: &str) -> Result<usize, SocketError> {
        let timeout = self.config.timeout;
        let stream = self.stream.as_mut().ok_or(SocketError::NotConnected)?;
        stream.set_write_timeout(Some(timeout))?;
        stream.write_all(data.as_bytes()).map_err(SocketError::from_io)?;
        stream.flush().map_err(SocketError::from_io)?;
        debug!(bytes = data.len(), "socket sent");
        Ok(data.len())
    }

    /// Receive one chunk of at most `max_buffer_size` bytes.
    pub fn receive(&mut self) -> Result<String, SocketError> {
        let timeout = self.config.timeout;
        self.read_chunk(Some(timeout))
    }

    /// Like `receive`, but waits until data arrives or the peer closes.
    pub fn receive_without_timeout(&mut self) -> Result<String, SocketError> {
        self.read_chunk(None)
    }

    fn read_chunk(&mut self, timeout: Option<Duration>) -> Result<String, SocketError> {
        let mut buffer = vec![0u8; self.config.max_buffer_size];
        let stream = self.stream.as_mut().ok_or(SocketError::NotConnected)?;
        stream.set_read_timeout(timeout)?;
        let read = stream.read(&mut buffer).map_err(SocketError::from_io)?;
        debug!(bytes = read, "socket received");
        Ok(decode_chunk(&buffer[..read]))
    }

    /// Shut the connection down. Later operations report `NotConnected`.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already have hung up.
            let _ = stream.shutdown(Shutdown::Both);
            debug!("socket closed");
        }
    }
}

impl Drop for SocketClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolve `host:port` on a helper thread, giving up after `timeout`.
fn resolve(host: &str, port: u16, timeout: Duration) -> Result<Vec<SocketAddr>, SocketError> {
    let (tx, rx) = mpsc::channel();
    let target = (host.to_string(), port);
    thread::Builder::new()
        .name("netkit-resolve".into())
        .spawn(move || {
            let result = target.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>());
            // The caller may have timed out already.
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => Ok(result?),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            debug!(host, port, "name resolution timed out");
            Err(SocketError::Timeout)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(SocketError::Resolve {
            host: host.to_string(),
            port,
        }),
    }
}

/// Try each address with whatever time is left before `deadline`.
fn connect_any(addrs: &[SocketAddr], deadline: Instant) -> Result<TcpStream, SocketError> {
    let mut last_err = None;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(SocketError::Timeout);
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => {
                debug!(%addr, "socket connected");
                return Ok(stream);
            }
            Err(err) => {
                debug!(%addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.map(SocketError::from_io).unwrap_or(SocketError::Timeout))
}

/// Lossy UTF-8 decode with NUL characters removed.
fn decode_chunk(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\0', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn operations_before_connect_fail() {
        let mut client = SocketClient::new();
        assert!(matches!(client.send("hi"), Err(SocketError::NotConnected)));
        assert!(matches!(client.receive(), Err(SocketError::NotConnected)));
        assert_eq!(client.receive().unwrap_err().to_string(), "Socket is not initialized");
        client.close();
        assert!(!client.is_connected());
    }

    #[test]
    fn decode_strips_nul_and_replaces_invalid_utf8() {
        assert_eq!(decode_chunk(b"ab\0c\0"), "abc");
        assert_eq!(decode_chunk(&[b'a', 0xff]), "a\u{fffd}");
    }

    #[test]
    fn receive_times_out_on_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = SocketClient::with_config(SocketConfig::new().with_timeout(Duration::from_millis(100)));
        client.connect("127.0.0.1", port).unwrap();
        let (_peer, _) = listener.accept().unwrap();

        let err = client.receive().unwrap_err();
        assert!(matches!(err, SocketError::Timeout));
        assert_eq!(err.to_string(), "Operation Timeout");
    }

    #[test]
    fn receive_is_capped_at_buffer_size() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = SocketClient::with_config(SocketConfig::new().with_max_buffer_size(4));
        client.connect("127.0.0.1", port).unwrap();
        let (mut peer, _) = listener.accept().unwrap();
        peer.write_all(b"abcdefgh").unwrap();
        peer.flush().unwrap();

        let first = client.receive().unwrap();
        assert!(!first.is_empty() && first.len() <= 4);
        assert!("abcdefgh".starts_with(&first));
    }

    #[test]
    fn close_then_send_is_not_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = SocketClient::new();
        client.connect("127.0.0.1", port).unwrap();
        assert!(client.is_connected());
        client.close();
        assert!(matches!(client.send("late"), Err(SocketError::NotConnected)));
    }

    #[test]
    fn connect_to_closed_port_fails() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut client = SocketClient::with_config(SocketConfig::new().with_timeout(Duration::from_millis(500)));
        assert!(client.connect("127.0.0.1", port).is_err());
        assert!(!client.is_connected());
    }

    #[test]
    fn zero_timeout_config_falls_back_to_default() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = SocketClient::with_config(SocketConfig {
            timeout: Duration::ZERO,
            max_buffer_size: 0,
        });
        assert_eq!(client.config(), &SocketConfig::default());

        client.connect("127.0.0.1", port).unwrap();
        let (mut peer, _) = listener.accept().unwrap();
        peer.write_all(b"ok").unwrap();
        assert_eq!(client.receive().unwrap(), "ok");
    }

    #[test]
    fn connect_attempts_share_one_deadline() {
        // Non-routable addresses either hang until the deadline or fail fast.
        let addrs: Vec<SocketAddr> = vec!["10.255.255.1:9".parse().unwrap(), "10.255.255.2:9".parse().unwrap()];
        let timeout = Duration::from_millis(300);

        let start = Instant::now();
        let result = connect_any(&addrs, start + timeout);
        assert!(result.is_err());
        assert!(start.elapsed() < timeout + Duration::from_millis(250), "took {:?}", start.elapsed());
    }

    #[test]
    fn connect_with_expired_deadline_times_out() {
        let addrs: Vec<SocketAddr> = vec!["127.0.0.1:9".parse().unwrap()];
        let result = connect_any(&addrs, Instant::now());
        assert!(matches!(result, Err(SocketError::Timeout)));
    }

    #[test]
    fn resolve_localhost() {
        let addrs = resolve("localhost", 80, Duration::from_secs(5)).unwrap();
        assert!(addrs.iter().all(|a| a.port() == 80 && a.ip().is_loopback()));
        assert!(!addrs.is_empty());
    }
}
