//! `license-request` fetches DRM license responses and other small binary
//! payloads.
//!
//! A [`LicenseRequest`] either:
//! - decodes an inline `data:` address locally, or
//! - `POST`s its body to a network address through a [`Transport`],
//!   retrying failed attempts with exponential backoff (see [`Parameters`]).

mod address;
mod error;
mod options;
mod request;
mod retry;
mod transport;

pub mod source;

pub use address::{Address, InlinePayload, DATA_PREFIX};
pub use error::{BoxError, LicenseError};
pub use options::Parameters;
pub use request::LicenseRequest;
pub use retry::{backoff_delay, AttemptRecord};
pub use transport::{HttpTransport, Transport, TransportRequest};

pub use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, LicenseError>;
