/*!
 * Transport collaborator used to fetch media playlists and segments.
 *
 * This module contains:
 * - `Transport`: the async trait the pipeline depends on
 * - `http`: a reqwest-backed implementation with retry and backoff
 * - `mock`: an in-memory implementation for tests and offline use
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::errors::TransportError;

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

/// Response returned by a transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lower-cased names
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// 200 response with the given body
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Response with an arbitrary status and empty body
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value by name, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Common trait for everything that can fetch a URI
///
/// Retry policy belongs to the implementation: an `Err` or a non-success
/// status returned from `get` is final for the caller.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Fetch a URI
    ///
    /// # Arguments
    /// * `uri` - Absolute URI to fetch
    ///
    /// # Returns
    /// * `Result<TransportResponse, TransportError>` - The response, whatever its status, or an error
    async fn get(&self, uri: &str) -> Result<TransportResponse, TransportError>;
}
