use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::{LicenseError, Result};

/// One outbound attempt, as handed to a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
    /// Network address of the license server.
    pub url: String,
    /// Request body, typically the key system's license challenge.
    pub body: Option<Vec<u8>>,
    /// Extra headers sent with the request.
    pub headers: Vec<(String, String)>,
}

/// Performs a single request attempt.
///
/// Implementations must not retry or sleep; the caller owns the retry loop.
/// A 2xx response yields its raw body, any other status yields
/// [`LicenseError::Http`], and failures without a status yield
/// [`LicenseError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` once and returns the response body.
    async fn execute(&self, request: &TransportRequest) -> Result<Vec<u8>>;
}

#[derive(Clone)]
/// [`Transport`] backed by a `reqwest` client, sending `POST` requests.
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with a fresh `reqwest` client and no timeout.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Reuses an existing client and its connection pool.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    /// Limits how long a single attempt may take. Without it, an attempt
    /// waits as long as the client allows.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &TransportRequest) -> Result<Vec<u8>> {
        let mut builder = self.http.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(LicenseError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LicenseError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(LicenseError::transport)?;
        Ok(bytes.to_vec())
    }
}
