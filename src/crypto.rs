// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload encryption.
//!
//! Every `pack` field on the wire is a JSON object serialized to text,
//! padded with PKCS#7, encrypted with AES-128 in ECB mode and encoded as
//! standard base64. Before a device is bound the protocol-wide generic key
//! is used; afterwards the device key negotiated during binding.
//!
//! ```
//! use greefan_lib::crypto::{decrypt, encrypt, PackKey};
//! use serde_json::json;
//!
//! let payload = json!({"t": "scan"}).as_object().unwrap().clone();
//! let blob = encrypt(&payload, PackKey::Generic).unwrap();
//! assert_eq!(decrypt(&blob, PackKey::Generic).unwrap(), payload);
//! ```

use aes::Aes128;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::CodecError;
use crate::types::DeviceKey;

/// A decrypted payload.
pub type Payload = serde_json::Map<String, Value>;

/// Protocol constant shared by every unit; only valid before binding.
const GENERIC_KEY: &[u8; 16] = b"a3K8Bx%2r8Y7#xDh";

const BLOCK_SIZE: usize = 16;

/// Key selection for a payload.
#[derive(Debug, Clone, Copy)]
pub enum PackKey<'a> {
    /// The generic key, for discovery and the bind handshake.
    Generic,
    /// A key negotiated with the device.
    Device(&'a DeviceKey),
}

impl PackKey<'_> {
    fn cipher(self) -> Result<Aes128, CodecError> {
        let bytes: &[u8] = match self {
            Self::Generic => GENERIC_KEY,
            Self::Device(key) => key.as_bytes(),
        };
        Aes128::new_from_slice(bytes).map_err(|_| CodecError::KeyLength(bytes.len()))
    }
}

/// Encrypts a payload into a base64 blob.
///
/// # Errors
///
/// Returns `CodecError::KeyLength` if a device key is not 16 bytes.
pub fn encrypt(payload: &Payload, key: PackKey<'_>) -> Result<String, CodecError> {
    let cipher = key.cipher()?;

    let mut buf = serde_json::to_vec(payload)?;
    let pad = BLOCK_SIZE - buf.len() % BLOCK_SIZE;
    // pad is 1..=16
    #[allow(clippy::cast_possible_truncation)]
    buf.resize(buf.len() + pad, pad as u8);

    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(block.into());
    }

    Ok(STANDARD.encode(buf))
}

/// Decrypts a base64 blob into a payload.
///
/// # Errors
///
/// Returns a `CodecError` if the blob is not valid base64, is not a whole
/// number of blocks, has invalid padding (typically a wrong key), or does
/// not decrypt to a JSON object.
pub fn decrypt(blob: &str, key: PackKey<'_>) -> Result<Payload, CodecError> {
    let cipher = key.cipher()?;

    let mut buf = STANDARD.decode(blob.trim())?;
    if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
        return Err(CodecError::BlockSize(buf.len()));
    }

    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(block.into());
    }

    let plain_len = unpad(&buf)?;
    match serde_json::from_slice(&buf[..plain_len])? {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject),
    }
}

/// Returns the plaintext length after stripping PKCS#7 padding.
fn unpad(buf: &[u8]) -> Result<usize, CodecError> {
    let pad = usize::from(*buf.last().ok_or(CodecError::Padding)?);
    if pad == 0 || pad > BLOCK_SIZE || pad > buf.len() {
        return Err(CodecError::Padding);
    }
    let (plain, padding) = buf.split_at(buf.len() - pad);
    if padding.iter().any(|&b| usize::from(b) != pad) {
        return Err(CodecError::Padding);
    }
    Ok(plain.len())
}
