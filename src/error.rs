//! Error handling for the client
//!
//! One error type for every layer below `ProtocolClient`. Nothing in the
//! library terminates the process; each failure is returned to the caller.

use std::path::PathBuf;
use std::time::Duration;

/// Client operation error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The aggregation service could not be reached
    #[error("cannot connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    /// A key record is missing, corrupt, or belongs to a different pair
    #[error("key storage error ({}): {reason}", path.display())]
    KeyStorage { path: PathBuf, reason: String },

    /// Envelope framing/decoding failed, including parameter mismatch
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A bulk-input cell is not an unsigned integer
    #[error("parse error at row {row}, column {column}: {reason}")]
    Parse {
        row: usize,
        column: usize,
        reason: String,
    },

    /// The per-call deadline elapsed
    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// Caller broke an input contract (vector too long, inverted range, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Scheme parameters are unusable
    #[error("invalid scheme parameters: {0}")]
    Parameters(String),

    /// The service answered with a non-success status
    #[error("server rejected request (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Any other transport-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// A stop-on-first-failure bulk write failed after committing `written` rows.
    ///
    /// Rows already written stay on the server; nothing is rolled back.
    #[error("bulk write stopped after {written} committed rows: {source}")]
    PartialWrite {
        written: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn key_storage(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::KeyStorage {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures a caller may reasonably retry.
    ///
    /// Retrying an upload after a timeout can store the row twice; uploads carry
    /// no idempotency key.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection { .. })
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Create a `Serialization` error with format string support
macro_rules! ser_err {
    ($($arg:tt)*) => {
        $crate::error::Error::Serialization(format!($($arg)*))
    };
}

pub(crate) use ser_err;
