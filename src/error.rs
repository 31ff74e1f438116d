// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `greefan` library.
//!
//! Callers of the device operations see one of three outcomes besides
//! success: the device could not be bound, it did not answer in time, or
//! its answer could not be decoded. Socket-level failures and value
//! validation have their own variants.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable device key could be established.
    #[error("device is not bound")]
    DeviceNotBound,

    /// The device did not send a matching reply in time.
    #[error("device did not respond within {0} ms")]
    DeviceTimeout(u64),

    /// A reply could not be decrypted or parsed.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// Socket-level failure.
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Timeout(ms) => Self::DeviceTimeout(ms),
            other => Self::Protocol(other),
        }
    }
}

/// Errors raised by the payload codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The AES key is not 16 bytes long.
    #[error("key must be 16 bytes, got {0}")]
    KeyLength(usize),

    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The ciphertext is not a whole number of AES blocks.
    #[error("ciphertext length {0} is not a multiple of 16")]
    BlockSize(usize),

    /// PKCS#7 padding is invalid, usually because the key is wrong.
    #[error("invalid padding")]
    Padding,

    /// The plaintext is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The plaintext is JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),
}

/// Errors related to the UDP transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket operation failed.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// No matching datagram arrived in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// An unknown property wire code was provided.
    #[error("unknown property code: {0}")]
    InvalidCode(String),

    /// A value does not name a known position of the given property.
    #[error("invalid {property} position: {value}")]
    InvalidPosition {
        /// The property the value was meant for.
        property: &'static str,
        /// The rejected value.
        value: i64,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 1,
            max: 12,
            actual: 13,
        };
        assert_eq!(err.to_string(), "value 13 is out of range [1, 12]");
    }

    #[test]
    fn protocol_timeout_becomes_device_timeout() {
        let err: Error = ProtocolError::Timeout(250).into();
        assert!(matches!(err, Error::DeviceTimeout(250)));
        assert_eq!(err.to_string(), "device did not respond within 250 ms");
    }

    #[test]
    fn protocol_io_stays_protocol() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        let err: Error = ProtocolError::Io(io).into();
        assert!(matches!(err, Error::Protocol(ProtocolError::Io(_))));
    }

    #[test]
    fn codec_error_display() {
        let err = CodecError::MissingField("dat".to_string());
        assert_eq!(err.to_string(), "missing field in payload: dat");
        let err: Error = err.into();
        assert!(matches!(err, Error::Decode(CodecError::MissingField(_))));
    }
}
