use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use crate::{
    address::Address,
    retry::{run_with_retry, AttemptLog, AttemptRecord},
    transport::{HttpTransport, Transport, TransportRequest},
    LicenseError, Parameters, Result,
};

/// A single-use request for a license (or any small binary resource).
///
/// The address is either a network endpoint, fetched with `POST` and
/// retried with exponential backoff, or an inline `data:` address decoded
/// locally without any network I/O.
pub struct LicenseRequest {
    address: String,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
    parameters: Parameters,
    transport: Arc<dyn Transport>,
    sent: AtomicBool,
    log: AttemptLog,
}

impl fmt::Debug for LicenseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseRequest")
            .field("address", &self.address)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("headers", &self.headers.len())
            .field("parameters", &self.parameters)
            .field("sent", &self.sent.load(Ordering::Relaxed))
            .finish()
    }
}

impl LicenseRequest {
    /// Creates a request using the default HTTP transport and parameters.
    pub fn new(address: impl Into<String>, body: Option<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            body,
            headers: Vec::new(),
            parameters: Parameters::default(),
            transport: Arc::new(HttpTransport::new()),
            sent: AtomicBool::new(false),
            log: AttemptLog::default(),
        }
    }

    /// Replaces the transport used for network addresses.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Applies retry parameters. They are validated when the request is sent.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds a header sent with every network attempt.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Address as given at construction.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Retry parameters applied on `send`.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Sends the request and returns the response bytes.
    ///
    /// Inline addresses are decoded immediately and never retried. Network
    /// addresses are attempted up to `max_attempts` times; on exhaustion the
    /// error of the last attempt is returned.
    ///
    /// A request may only be sent once. Calling `send` again is a caller bug
    /// and returns [`LicenseError::AlreadySent`] without any I/O.
    pub async fn send(&self) -> Result<Vec<u8>> {
        if self.sent.swap(true, Ordering::AcqRel) {
            return Err(LicenseError::AlreadySent);
        }

        let url = match Address::resolve(&self.address)? {
            Address::Inline(payload) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    mime_type = ?payload.mime_type,
                    base64 = payload.is_base64,
                    "decoding inline license payload"
                );
                return payload.decode();
            }
            Address::Network(url) => url,
        };

        self.parameters.validate()?;

        let request = TransportRequest {
            url,
            body: self.body.clone(),
            headers: self.headers.clone(),
        };
        run_with_retry(self.transport.as_ref(), &request, &self.parameters, &self.log).await
    }

    /// Backoff waited before the most recent attempt.
    ///
    /// Zero when no retry happened or the address was inline.
    pub fn last_delay(&self) -> Duration {
        self.log.last_delay()
    }

    /// Number of transport attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.log.attempts()
    }

    /// Every attempt made so far, in order.
    pub fn attempt_records(&self) -> Vec<AttemptRecord> {
        self.log.records()
    }
}
