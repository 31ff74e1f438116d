// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binding state machine.
//!
//! A device session moves through:
//!
//! ```text
//! Unbound ──begin_handshake──▶ AwaitingKey ──complete_handshake──▶ Bound
//!    │                              │
//!    │                              └──abort_handshake / no key──▶ previous state
//!    └────────────accept_key───────────────────────────────────────▶ Bound
//! ```
//!
//! `accept_key` is also allowed from `Bound` and overwrites the key. A new
//! handshake may start from `Bound` to re-bind; if it fails the previous
//! key is kept.
//!
//! This type only tracks state. The network exchange lives in
//! [`SyncClient::negotiate_key`](crate::protocol::SyncClient::negotiate_key).

use crate::crypto::Payload;
use crate::error::Error;
use crate::types::DeviceKey;

/// Binding state of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindState {
    /// No key known.
    #[default]
    Unbound,
    /// Bind request sent, waiting for the reply.
    AwaitingKey,
    /// A key is held.
    Bound,
}

/// Binding state and the key it produced.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    state: BindState,
    key: Option<DeviceKey>,
}

impl Binding {
    /// Creates an unbound session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> BindState {
        self.state
    }

    /// Returns the key if bound.
    #[must_use]
    pub fn key(&self) -> Option<&DeviceKey> {
        match self.state {
            BindState::Bound => self.key.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` if a key is held.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state == BindState::Bound
    }

    /// Accepts a caller supplied key without any exchange.
    pub fn accept_key(&mut self, key: DeviceKey) {
        self.key = Some(key);
        self.state = BindState::Bound;
    }

    /// Marks the bind request as sent.
    pub fn begin_handshake(&mut self) {
        self.state = BindState::AwaitingKey;
    }

    /// Consumes the bind reply payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotBound` if the reply carries no key, or if no
    /// handshake is in progress.
    pub fn complete_handshake(&mut self, reply: &Payload) -> Result<&DeviceKey, Error> {
        if self.state != BindState::AwaitingKey {
            return Err(Error::DeviceNotBound);
        }

        let key = reply
            .get("key")
            .and_then(serde_json::Value::as_str)
            .filter(|k| !k.is_empty());

        match key {
            Some(key) => {
                self.state = BindState::Bound;
                Ok(self.key.insert(DeviceKey::new(key)))
            }
            None => {
                self.abort_handshake();
                Err(Error::DeviceNotBound)
            }
        }
    }

    /// Abandons a handshake, returning to the last stable state.
    pub fn abort_handshake(&mut self) {
        if self.state == BindState::AwaitingKey {
            self.state = if self.key.is_some() {
                BindState::Bound
            } else {
                BindState::Unbound
            };
        }
    }
}
