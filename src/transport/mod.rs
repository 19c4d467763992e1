//! Request/response channel to the aggregation service
//!
//! [`Transport`] is the boundary `ProtocolClient` talks to. Implementations
//! attach the bearer credential to every call and bound each call by a
//! deadline. Uploads carry no idempotency key: retrying an upload that timed
//! out may store the row twice.
//!
//! The JSON bodies of the HTTP binding live here so servers and test doubles
//! can share them.

mod http;

pub use http::{HttpTransport, DEFAULT_DEADLINE, TOKEN_HEADER};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half-open timestamp range `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRange {
    pub from: i64,
    pub to: i64,
}

impl TimestampRange {
    /// Returns `InvalidInput` if `from > to`; `from == to` is an empty range
    pub fn new(from: i64, to: i64) -> Result<Self> {
        if from > to {
            return Err(Error::InvalidInput(format!(
                "timestamp range is inverted: from {} > to {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.from <= timestamp && timestamp < self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Answer to an evaluation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalReply {
    /// Informational message from the server
    pub message: String,
    /// Result envelope bytes
    pub result: Vec<u8>,
}

/// Authenticated, deadline-bounded channel to the aggregation service
pub trait Transport {
    /// Store one ciphertext envelope; returns the server's acknowledgement
    fn upload(&self, envelope: &[u8]) -> Result<String>;

    /// Submit a query envelope for the stored rows in `range`
    fn eval(&self, query: &[u8], range: TimestampRange) -> Result<EvalReply>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn upload(&self, envelope: &[u8]) -> Result<String> {
        (**self).upload(envelope)
    }

    fn eval(&self, query: &[u8], range: TimestampRange) -> Result<EvalReply> {
        (**self).eval(query, range)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn upload(&self, envelope: &[u8]) -> Result<String> {
        (**self).upload(envelope)
    }

    fn eval(&self, query: &[u8], range: TimestampRange) -> Result<EvalReply> {
        (**self).eval(query, range)
    }
}

/// Body of `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Hex-encoded ciphertext envelope
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

/// Body of `POST /eval`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRequest {
    /// Hex-encoded query envelope
    pub request: String,
    pub from_timestamp: i64,
    pub to_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResponse {
    pub message: String,
    /// Hex-encoded result envelope
    pub response: String,
}

/// Body of any non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
