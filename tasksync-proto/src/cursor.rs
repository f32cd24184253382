//! Page-token codec for cursor pagination.
//!
//! A [`PageToken`] names the record at which the next page starts. On the
//! wire it is the URL-safe, unpadded base64 form of the record id's eight
//! big-endian bytes. Clients treat it as opaque.
//!
//! Decoding is strict: padding, foreign alphabet characters, the wrong
//! length and non-zero trailing bits are all rejected. As a result every
//! token that decodes re-encodes to exactly the same string.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::task::RecordId;

/// Errors that can occur while decoding a page token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token is not valid unpadded URL-safe base64.
    #[error("page token is not valid base64: {0}")]
    InvalidEncoding(String),
    /// The token decodes to the wrong number of bytes.
    #[error("page token decodes to {0} bytes, expected 8")]
    InvalidLength(usize),
}

/// Opaque resume point for a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    /// Wraps a token string received from the server.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes a record id as a page token.
#[must_use]
pub fn encode(id: RecordId) -> PageToken {
    PageToken(URL_SAFE_NO_PAD.encode(id.get().to_be_bytes()))
}

/// Decodes a page token back into the record id it names.
///
/// # Errors
///
/// Returns [`CursorError::InvalidEncoding`] if the text is not canonical
/// unpadded URL-safe base64, or [`CursorError::InvalidLength`] if it does
/// not carry exactly eight bytes.
pub fn decode(token: &str) -> Result<RecordId, CursorError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| CursorError::InvalidEncoding(e.to_string()))?;
    let raw: [u8; 8] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CursorError::InvalidLength(bytes.len()))?;
    Ok(RecordId::new(u64::from_be_bytes(raw)))
}
