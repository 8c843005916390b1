//! Classification of request addresses and decoding of inline `data:` payloads.
//!
//! Accepted inline syntax: `data:[<mime type>][;<param>]*[;base64],<payload>`.
//! When no `,` is present, everything after the last `;` is the payload and the
//! payload is percent-decoded. A `base64` flag always needs the `,` separator.

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine as _,
};
use percent_encoding::percent_decode_str;

use crate::{LicenseError, Result};

/// Prefix that marks an address as an inline payload.
pub const DATA_PREFIX: &str = "data:";

const BASE64_TOKEN: &str = "base64";

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Where the bytes of a request come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    /// Content embedded in the address itself.
    Inline(InlinePayload),
    /// Remote endpoint that must be fetched.
    Network(String),
}

impl Address {
    /// Classifies an address string.
    ///
    /// Only inline payloads are parsed here; network addresses are passed
    /// through untouched and validated by the transport.
    pub fn resolve(address: &str) -> Result<Self> {
        match address.strip_prefix(DATA_PREFIX) {
            Some(rest) => InlinePayload::parse(rest).map(Self::Inline),
            None => Ok(Self::Network(address.to_owned())),
        }
    }

    /// Whether the address carries its own payload.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

/// Parsed contents of a `data:` address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlinePayload {
    /// Declared media type, if any. Does not affect decoding.
    pub mime_type: Option<String>,
    /// Whether the payload is base64 rather than percent-encoded.
    pub is_base64: bool,
    /// Payload text exactly as it appeared in the address.
    pub raw_payload: String,
}

impl InlinePayload {
    /// Parses the part of a `data:` address that follows the prefix.
    pub fn parse(rest: &str) -> Result<Self> {
        let (metadata, payload, has_separator) = match rest.find(',') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..], true),
            None => match rest.rfind(';') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..], false),
                None => ("", rest, false),
            },
        };

        let mut mime_type = None;
        let mut is_base64 = false;
        for token in metadata.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case(BASE64_TOKEN) {
                is_base64 = true;
            } else if mime_type.is_none() && token.contains('/') {
                mime_type = Some(token.to_owned());
            }
        }

        if !has_separator && (is_base64 || payload.eq_ignore_ascii_case(BASE64_TOKEN)) {
            return Err(LicenseError::Parse(
                "missing ',' between base64 flag and payload".to_owned(),
            ));
        }

        Ok(Self {
            mime_type,
            is_base64,
            raw_payload: payload.to_owned(),
        })
    }

    /// Decodes the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        if self.is_base64 {
            let compact: String = self
                .raw_payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            return PAYLOAD_ENGINE
                .decode(compact)
                .map_err(|err| LicenseError::Parse(format!("invalid base64 payload: {err}")));
        }

        ensure_valid_escapes(&self.raw_payload)?;
        Ok(percent_decode_str(&self.raw_payload).collect())
    }
}

/// Rejects `%` sequences that are not followed by two hex digits.
fn ensure_valid_escapes(payload: &str) -> Result<()> {
    let bytes = payload.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] != b'%' {
            idx += 1;
            continue;
        }
        let valid = bytes
            .get(idx + 1..idx + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(LicenseError::Parse(format!(
                "invalid percent escape at byte {idx}"
            )));
        }
        idx += 3;
    }
    Ok(())
}
