//! HTTP/JSON transport over a blocking reqwest client

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{
    ErrorResponse, EvalReply, EvalRequest, EvalResponse, TimestampRange, Transport, UploadRequest,
    UploadResponse,
};
use crate::error::{ser_err, Error, Result};

/// Per-call deadline used when none is configured
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

/// Request metadata key carrying the bearer credential
pub const TOKEN_HEADER: &str = "token";

/// `Transport` speaking JSON to `{base}/upload` and `{base}/eval`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: HeaderValue,
    deadline: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self> {
        Self::with_deadline(base_url, token, DEFAULT_DEADLINE)
    }

    /// Every call (connect, send, and read of the response) must finish within `deadline`
    pub fn with_deadline(base_url: impl Into<String>, token: &str, deadline: Duration) -> Result<Self> {
        if deadline.is_zero() {
            return Err(Error::InvalidInput("deadline must be non-zero".into()));
        }
        let mut token = HeaderValue::from_str(token)
            .map_err(|_| Error::InvalidInput("token is not a valid header value".into()))?;
        token.set_sensitive(true);

        let client = Client::builder()
            .timeout(deadline)
            .connect_timeout(deadline)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            deadline,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, route: &str, body: &B) -> Result<R> {
        let url = format!("{}/{}", self.base_url, route);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, self.token.clone())
            .json(body)
            .send()
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        let text = response.text().map_err(|e| self.classify(&url, e))?;
        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "POST"
        );

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(Error::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| ser_err!("malformed response from {}: {}", url, e))
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.deadline)
        } else if err.is_connect() {
            Error::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl Transport for HttpTransport {
    fn upload(&self, envelope: &[u8]) -> Result<String> {
        let body = UploadRequest {
            file: hex::encode(envelope),
        };
        let reply: UploadResponse = self.post("upload", &body)?;
        Ok(reply.message)
    }

    fn eval(&self, query: &[u8], range: TimestampRange) -> Result<EvalReply> {
        let body = EvalRequest {
            request: hex::encode(query),
            from_timestamp: range.from,
            to_timestamp: range.to,
        };
        let reply: EvalResponse = self.post("eval", &body)?;
        let result = hex::decode(&reply.response)
            .map_err(|e| ser_err!("result envelope is not valid hex: {}", e))?;
        Ok(EvalReply {
            message: reply.message,
            result,
        })
    }
}
