// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire envelope.
//!
//! Every datagram is a JSON object:
//!
//! | field  | meaning                                             |
//! |--------|-----------------------------------------------------|
//! | `t`    | message kind (`scan`, `pack`, ...)                  |
//! | `i`    | sequence number                                     |
//! | `uid`  | always `0`                                          |
//! | `cid`  | sender identifier (`app` for us, the mac for units) |
//! | `tcid` | target identifier                                   |
//! | `pack` | encrypted payload, or a plain object                |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{self, PackKey, Payload};
use crate::error::CodecError;

/// Identifier the controller uses as `cid`.
pub const CONTROLLER_ID: &str = "app";

/// Message kinds carried in the envelope `t` field and inside payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Discovery broadcast.
    Scan,
    /// Envelope carrying a payload.
    Pack,
    /// Discovery reply payload.
    Dev,
    /// Bind request payload.
    Bind,
    /// Bind reply payload.
    BindOk,
    /// Status request payload.
    Status,
    /// Status reply payload.
    Dat,
    /// Command request payload.
    Cmd,
    /// Command reply payload.
    Res,
}

impl MessageKind {
    /// Returns the wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Pack => "pack",
            Self::Dev => "dev",
            Self::Bind => "bind",
            Self::BindOk => "bindok",
            Self::Status => "status",
            Self::Dat => "dat",
            Self::Cmd => "cmd",
            Self::Res => "res",
        }
    }

    /// Returns `false` if `payload` names a different kind in its `t`
    /// field. Payloads without a `t` are accepted.
    #[must_use]
    pub fn labels(self, payload: &Payload) -> bool {
        payload
            .get("t")
            .and_then(Value::as_str)
            .is_none_or(|t| t == self.as_str())
    }
}

/// The outer wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind.
    pub t: MessageKind,
    /// Sequence number.
    #[serde(default)]
    pub i: u32,
    /// User id, normally zero.
    #[serde(default)]
    pub uid: u32,
    /// Sender identifier.
    #[serde(default)]
    pub cid: String,
    /// Target identifier.
    #[serde(default)]
    pub tcid: String,
    /// Payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<Value>,
}

impl Envelope {
    /// Creates a discovery broadcast, `{"t": "scan"}` on the wire.
    #[must_use]
    pub fn scan() -> Self {
        Self {
            t: MessageKind::Scan,
            i: 0,
            uid: 0,
            cid: String::new(),
            tcid: String::new(),
            pack: None,
        }
    }

    /// Creates a request envelope addressed to `target` with an encrypted
    /// payload.
    #[must_use]
    pub fn request(seq: u32, target: &str, blob: String) -> Self {
        Self {
            t: MessageKind::Pack,
            i: seq,
            uid: 0,
            cid: CONTROLLER_ID.to_string(),
            tcid: target.to_string(),
            pack: Some(Value::String(blob)),
        }
    }

    /// Serializes the envelope into datagram bytes.
    ///
    /// A scan only carries its kind, which is what units expect.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Json` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        if self.t == MessageKind::Scan {
            return Ok(serde_json::json!({ "t": MessageKind::Scan.as_str() })
                .to_string()
                .into_bytes());
        }
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses datagram bytes, returning `None` for anything that is not a
    /// well-formed envelope.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    /// Returns `true` if this envelope answers request `seq` sent to `mac`.
    ///
    /// Some firmware leaves `cid` empty in replies, so an empty sender is
    /// accepted.
    #[must_use]
    pub fn answers(&self, seq: u32, mac: &str) -> bool {
        self.t == MessageKind::Pack && self.i == seq && (self.cid.is_empty() || self.cid == mac)
    }

    /// Returns the decoded payload.
    ///
    /// Encrypted (string) payloads are decrypted with `key`; plain object
    /// payloads are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns a `CodecError` if the payload is missing or cannot be
    /// decrypted into an object.
    pub fn open(&self, key: PackKey<'_>) -> Result<Payload, CodecError> {
        match &self.pack {
            Some(Value::String(blob)) => crypto::decrypt(blob, key),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(CodecError::NotAnObject),
            None => Err(CodecError::MissingField("pack".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scan_serializes_to_kind_only() {
        let bytes = Envelope::scan().to_bytes().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"t": "scan"}));
    }

    #[test]
    fn request_carries_routing_fields() {
        let env = Envelope::request(7, "aabbcc112233", "blob".to_string());
        let value: Value = serde_json::from_slice(&env.to_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "t": "pack",
                "i": 7,
                "uid": 0,
                "cid": "app",
                "tcid": "aabbcc112233",
                "pack": "blob"
            })
        );
    }

    #[test]
    fn parses_discovery_reply_with_plain_pack() {
        let raw = json!({
            "t": "pack",
            "i": 1,
            "uid": 0,
            "cid": "",
            "tcid": "",
            "pack": {"t": "dev", "mac": "aabbcc112233", "name": "fake unit"}
        });
        let env = Envelope::from_bytes(raw.to_string().as_bytes()).unwrap();
        let payload = env.open(PackKey::Generic).unwrap();
        assert_eq!(payload["mac"], "aabbcc112233");
    }

    #[test]
    fn garbage_is_not_an_envelope() {
        assert!(Envelope::from_bytes(b"hello").is_none());
        assert!(Envelope::from_bytes(br#"{"i": 1}"#).is_none());
        assert!(Envelope::from_bytes(br#"{"t": "nope"}"#).is_none());
    }

    #[test]
    fn answers_matches_sequence_and_sender() {
        let mut env = Envelope::request(5, "", String::new());
        env.cid = "aabbcc112233".to_string();
        assert!(env.answers(5, "aabbcc112233"));
        assert!(!env.answers(6, "aabbcc112233"));
        assert!(!env.answers(5, "ffffff000000"));

        env.cid.clear();
        assert!(env.answers(5, "ffffff000000"));
    }

    #[test]
    fn payload_kind_must_match_when_present() {
        let descriptor = json!({"t": "dev", "mac": "aabbcc112233"});
        let descriptor = descriptor.as_object().unwrap();
        assert!(!MessageKind::BindOk.labels(descriptor));
        assert!(MessageKind::Dev.labels(descriptor));

        let bare = json!({"key": "St8Vw1Yz4Bc7Ef0H"});
        assert!(MessageKind::BindOk.labels(bare.as_object().unwrap()));
    }

    #[test]
    fn open_without_pack_fails() {
        let env = Envelope::scan();
        assert!(matches!(
            env.open(PackKey::Generic),
            Err(CodecError::MissingField(_))
        ));
    }
}
