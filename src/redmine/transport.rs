//! Transport capability
//!
//! Everything above this module talks to the server through [`Transport`],
//! so the HTTP client can be swapped for an in-memory stub in tests.

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// HTTP verbs used by the Redmine REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a [`Transport`]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to reach server: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("API request failed: {status}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Connection(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Undecoded server answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Parse the body as JSON. An empty body decodes to `Value::Null`.
    pub fn json(&self) -> Result<Value, TransportError> {
        if self.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Issues one request against the API.
///
/// `path` is relative to the server root and already carries its query
/// string. `body` is a serialized XML document for POST and PUT.
pub trait Transport {
    fn perform(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}
