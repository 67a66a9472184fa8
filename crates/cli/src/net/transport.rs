// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for HTTP calls.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP requests for production (reqwest)
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::task::{HttpRequest, Method};

/// Error type for transport operations. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The call did not finish within its timeout.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The server answered with a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    /// Could not reach the server.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body was not JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + 'a>>;

/// Transport trait for request/response calls.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Perform one call and return the parsed JSON body (`null` if empty).
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport that resolves relative paths against `base_url`.
    pub fn new(base_url: impl Into<String>) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(HttpTransport { client, base_url: base_url.into() })
    }

    /// Absolute URLs pass through; paths are joined to the base URL.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!("{}/{}", self.base_url.trim_end_matches('/'), url.trim_start_matches('/'))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(to_reqwest(request.method), self.resolve(&request.url))
                .timeout(request.timeout);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(request.timeout.as_millis() as u64)
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

            let status = response.status();
            let bytes =
                response.bytes().await.map_err(|e| TransportError::Connection(e.to_string()))?;
            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
        })
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
