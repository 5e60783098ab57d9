//! Runs a prepared exchange off the caller's thread and resolves it once.
//!
//! # Design
//! `launch` moves the request and a delivery closure onto a worker: the
//! Tokio blocking pool when called inside a runtime, a dedicated thread
//! otherwise. The closure is wrapped in `Delivery`, whose `Drop` reports an
//! empty failure if the worker never ran it (thread spawn failure, runtime
//! shutdown), so every launched request resolves exactly once.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FailedResponse, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Final result of a begun request: the decoded body, or the failure payload.
pub type Outcome = Result<String, FailedResponse>;

/// Classify a transport result.
///
/// 2xx bodies succeed; other statuses fail with their body; faults without a
/// response fail with an empty body.
pub fn resolve(result: Result<HttpResponse, TransportError>) -> Outcome {
    match result {
        Ok(response) if response.is_success() => Ok(response.body),
        Ok(response) => Err(FailedResponse {
            status: Some(response.status),
            body: response.body,
        }),
        Err(_) => Err(FailedResponse::empty()),
    }
}

struct Delivery<F: FnOnce(Outcome)> {
    deliver: Option<F>,
}

impl<F: FnOnce(Outcome)> Delivery<F> {
    fn new(deliver: F) -> Self {
        Self {
            deliver: Some(deliver),
        }
    }

    fn complete(mut self, outcome: Outcome) {
        if let Some(deliver) = self.deliver.take() {
            deliver(outcome);
        }
    }
}

impl<F: FnOnce(Outcome)> Drop for Delivery<F> {
    fn drop(&mut self) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Err(FailedResponse::empty()));
        }
    }
}

/// Execute `request` on a worker and hand the outcome to `deliver`.
pub(crate) fn launch<F>(request: HttpRequest, transport: Arc<dyn Transport>, deliver: F)
where
    F: FnOnce(Outcome) + Send + 'static,
{
    let id = Uuid::new_v4();
    debug!(%id, method = request.method.as_str(), url = %request.url, "request sent");

    let delivery = Delivery::new(deliver);
    let job = move || {
        let result = catch_unwind(AssertUnwindSafe(|| transport.execute(request)))
            .unwrap_or(Err(TransportError::Panicked));
        if let Err(err) = &result {
            warn!(%id, error = %err, "transport fault");
        }
        let outcome = resolve(result);
        debug!(%id, success = outcome.is_ok(), "request resolved");
        delivery.complete(outcome);
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => {
            if let Err(err) = std::thread::Builder::new()
                .name("netkit-request".to_string())
                .spawn(job)
            {
                warn!(%id, error = %err, "failed to start request thread");
            }
        }
    }
}

/// Handle to a request in flight.
///
/// Await it inside async code, or call `wait` from a plain thread. Dropping
/// it abandons the result; the exchange itself still runs to completion.
#[derive(Debug)]
pub struct PendingResponse {
    receiver: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    pub(crate) fn spawn(request: HttpRequest, transport: Arc<dyn Transport>) -> Self {
        let (sender, receiver) = oneshot::channel();
        launch(request, transport, move |outcome| {
            // The receiver may already be gone; nothing to report then.
            let _ = sender.send(outcome);
        });
        Self { receiver }
    }

    /// Block the current thread until the request resolves.
    ///
    /// Panics when called from within an async runtime; `.await` instead.
    pub fn wait(self) -> Outcome {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(FailedResponse::empty()))
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(FailedResponse::empty())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{get_request, FixedTransport, PanickingTransport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn resolve_success_returns_body() {
        assert_eq!(resolve(Ok(response(200, "ok"))), Ok("ok".to_string()));
    }

    #[test]
    fn resolve_non_success_carries_status_and_body() {
        let failed = resolve(Ok(response(404, "not found"))).unwrap_err();
        assert_eq!(failed.status, Some(404));
        assert_eq!(failed.body, "not found");
    }

    #[test]
    fn resolve_fault_without_response_is_empty() {
        let failed = resolve(Err(TransportError::Connection("refused".to_string()))).unwrap_err();
        assert_eq!(failed, FailedResponse::empty());
    }

    #[test]
    fn wait_outside_runtime_uses_thread() {
        let transport = Arc::new(FixedTransport::ok("hello"));
        let pending = PendingResponse::spawn(get_request("http://x/test"), transport.clone());
        assert_eq!(pending.wait(), Ok("hello".to_string()));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn await_inside_runtime_uses_blocking_pool() {
        let transport = Arc::new(FixedTransport::status(500, "boom"));
        let outcome = PendingResponse::spawn(get_request("http://x/test"), transport).await;
        let failed = outcome.unwrap_err();
        assert_eq!(failed.status, Some(500));
        assert_eq!(failed.body, "boom");
    }

    #[test]
    fn panicking_transport_resolves_with_empty_failure() {
        let pending = PendingResponse::spawn(get_request("http://x/test"), Arc::new(PanickingTransport));
        assert_eq!(pending.wait(), Err(FailedResponse::empty()));
    }

    #[test]
    fn launch_delivers_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let counter = count.clone();
        launch(
            get_request("http://x/test"),
            Arc::new(FixedTransport::ok("body")),
            move |outcome| {
                counter.fetch_add(1, Ordering::SeqCst);
                tx.send(outcome).unwrap();
            },
        );
        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome, Ok("body".to_string()));
        // A second delivery would arrive on the channel.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_delivery_reports_empty_failure() {
        let (tx, rx) = mpsc::channel();
        let delivery = Delivery::new(move |outcome| tx.send(outcome).unwrap());
        drop(delivery);
        assert_eq!(rx.recv().unwrap(), Err(FailedResponse::empty()));
    }

    #[test]
    fn request_method_is_passed_through() {
        let transport = Arc::new(FixedTransport::ok(""));
        let mut request = get_request("http://x/test");
        request.method = HttpMethod::Post;
        PendingResponse::spawn(request, transport.clone()).wait().unwrap();
        assert_eq!(transport.last_request().unwrap().method, HttpMethod::Post);
    }
}
