/*!
 * In-memory transport for tests and offline runs.
 *
 * Routes are registered per URI:
 * - `with_body` serves a 200 response
 * - `with_status` serves an empty response with the given status
 * - `with_error` fails the request with a transport error
 * - `with_delay` delays a route, to shuffle completion order
 *
 * Unregistered URIs get a 404.
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TransportError;

use super::{Transport, TransportResponse};

#[derive(Debug, Clone)]
enum MockRoute {
    Response(TransportResponse),
    Error(TransportError),
}

/// Mock transport serving registered routes
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    routes: HashMap<String, MockRoute>,
    delays: HashMap<String, Duration>,
    /// URIs requested so far, in request order
    requests: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200
    pub fn with_body(mut self, uri: &str, body: impl Into<Bytes>) -> Self {
        self.routes
            .insert(uri.to_string(), MockRoute::Response(TransportResponse::ok(body)));
        self
    }

    /// Serve an empty response with `status`
    pub fn with_status(mut self, uri: &str, status: u16) -> Self {
        self.routes.insert(
            uri.to_string(),
            MockRoute::Response(TransportResponse::with_status(status)),
        );
        self
    }

    /// Fail requests to `uri`
    pub fn with_error(mut self, uri: &str, error: TransportError) -> Self {
        self.routes.insert(uri.to_string(), MockRoute::Error(error));
        self
    }

    /// Delay responses for `uri`
    pub fn with_delay(mut self, uri: &str, delay: Duration) -> Self {
        self.delays.insert(uri.to_string(), delay);
        self
    }

    /// URIs requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Number of requests made for `uri`
    pub fn request_count(&self, uri: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.as_str() == uri).count()
    }

    /// Highest number of requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, uri: &str) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(uri.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        match self.delays.get(uri) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => tokio::task::yield_now().await,
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.routes.get(uri) {
            Some(MockRoute::Response(response)) => Ok(response.clone()),
            Some(MockRoute::Error(error)) => Err(error.clone()),
            None => Ok(TransportResponse::with_status(404)),
        }
    }
}
