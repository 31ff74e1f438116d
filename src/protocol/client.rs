// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request/response exchanges with a unit.
//!
//! Each exchange opens a socket, sends one request and reads until a reply
//! with the same sequence number arrives from the unit or the timeout
//! lapses. Datagrams that are malformed or answer a different request are
//! dropped and the read continues. Nothing is retried.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::{Value, json};
use tokio::time::Instant;

use crate::binding::Binding;
use crate::crypto::{PackKey, Payload};
use crate::device::DeviceInfo;
use crate::error::{CodecError, Error, ProtocolError};
use crate::protocol::ClientConfig;
use crate::protocol::envelope::MessageKind;
use crate::protocol::socket::EnvelopeSocket;
use crate::types::DeviceKey;

/// Sequence number of every bind request.
const BIND_SEQUENCE: u32 = 1;

/// First sequence number used for status and command requests.
const FIRST_SEQUENCE: u32 = 2;

/// Client issuing bind, status and command exchanges.
///
/// A client is normally owned by one [`Device`](crate::Device), which keeps
/// at most one exchange in flight.
#[derive(Debug)]
pub struct SyncClient {
    config: ClientConfig,
    sequence: AtomicU32,
}

impl SyncClient {
    /// Creates a client with the given configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            sequence: AtomicU32::new(FIRST_SEQUENCE),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn next_sequence(&self) -> u32 {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        // skip the bind sequence number on wrap-around
        if seq < FIRST_SEQUENCE {
            self.sequence.store(FIRST_SEQUENCE + 1, Ordering::Relaxed);
            return FIRST_SEQUENCE;
        }
        seq
    }

    /// Runs the bind handshake and stores the negotiated key in `binding`.
    ///
    /// Both the request and the reply use the generic key.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotBound` if the device has no mac or the reply
    ///   carries no key
    /// - `Error::DeviceTimeout` if no reply arrives in time
    pub async fn negotiate_key(
        &self,
        info: &DeviceInfo,
        binding: &mut Binding,
    ) -> Result<DeviceKey, Error> {
        if info.mac().is_empty() {
            return Err(Error::DeviceNotBound);
        }

        let mut request = Payload::new();
        request.insert("mac".into(), json!(info.mac()));
        request.insert("t".into(), json!(MessageKind::Bind.as_str()));
        request.insert("uid".into(), json!(0));

        binding.begin_handshake();
        tracing::debug!(mac = %info.mac(), "Sending bind request");

        let reply = match self
            .exchange(
                info,
                BIND_SEQUENCE,
                &request,
                PackKey::Generic,
                MessageKind::BindOk,
                Ok,
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                binding.abort_handshake();
                return Err(e);
            }
        };

        let key = binding.complete_handshake(&reply)?.clone();
        tracing::info!(mac = %info.mac(), "Bound to device");
        Ok(key)
    }

    /// Reads `codes` from the device.
    ///
    /// Binds first when `binding` holds no key.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceTimeout` if no matching reply arrives in time
    /// - `Error::Decode` if the reply cannot be decrypted or lacks the
    ///   `cols`/`dat` lists
    pub async fn pull_properties(
        &self,
        codes: &[&str],
        info: &DeviceInfo,
        binding: &mut Binding,
    ) -> Result<HashMap<String, Value>, Error> {
        let key = self.session_key(info, binding).await?;

        let mut request = Payload::new();
        request.insert("cols".into(), json!(codes));
        request.insert("mac".into(), json!(info.mac()));
        request.insert("t".into(), json!(MessageKind::Status.as_str()));

        let seq = self.next_sequence();
        tracing::debug!(seq, cols = ?codes, "Requesting status");
        self.exchange(
            info,
            seq,
            &request,
            PackKey::Device(&key),
            MessageKind::Dat,
            |reply| zip_status(&reply),
        )
        .await
    }

    /// Writes `values` to the device.
    ///
    /// Binds first when `binding` holds no key. The reply is only used as an
    /// acknowledgement.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceTimeout` if no matching reply arrives in time
    /// - `Error::Decode` if the reply cannot be decrypted
    pub async fn push_properties(
        &self,
        values: &[(&str, i64)],
        info: &DeviceInfo,
        binding: &mut Binding,
    ) -> Result<(), Error> {
        let key = self.session_key(info, binding).await?;

        let (codes, targets): (Vec<&str>, Vec<i64>) = values.iter().copied().unzip();
        let mut request = Payload::new();
        request.insert("opt".into(), json!(codes));
        request.insert("p".into(), json!(targets));
        request.insert("t".into(), json!(MessageKind::Cmd.as_str()));

        let seq = self.next_sequence();
        tracing::debug!(seq, opt = ?codes, p = ?targets, "Sending command");
        let reply = self
            .exchange(info, seq, &request, PackKey::Device(&key), MessageKind::Res, Ok)
            .await?;

        tracing::trace!(seq, reply = ?reply, "Command acknowledged");
        Ok(())
    }

    async fn session_key(
        &self,
        info: &DeviceInfo,
        binding: &mut Binding,
    ) -> Result<DeviceKey, Error> {
        match binding.key() {
            Some(key) => Ok(key.clone()),
            None => self.negotiate_key(info, binding).await,
        }
    }

    /// Sends `request` and waits for the reply that answers it.
    ///
    /// A correlated reply that cannot be opened, is of another kind than
    /// `expected`, or that `parse` rejects is dropped and the read goes on.
    /// If the deadline passes after a rejected reply, its decode error is
    /// returned instead of a timeout.
    async fn exchange<T>(
        &self,
        info: &DeviceInfo,
        seq: u32,
        request: &Payload,
        key: PackKey<'_>,
        expected: MessageKind,
        parse: impl Fn(Payload) -> Result<T, CodecError>,
    ) -> Result<T, Error> {
        let target = info.socket_addr();
        let socket = EnvelopeSocket::bind(self.config.local_addr(), false).await?;
        socket.send(seq, info.mac(), request, key, target).await?;

        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;
        let mut rejected: Option<CodecError> = None;
        loop {
            let (envelope, from) = match socket.next_envelope(deadline, timeout).await {
                Ok(received) => received,
                Err(ProtocolError::Timeout(ms)) => {
                    return Err(rejected.map_or(Error::DeviceTimeout(ms), Error::Decode));
                }
                Err(e) => return Err(e.into()),
            };

            if !envelope.answers(seq, info.mac()) {
                tracing::debug!(
                    from = %from,
                    expected = seq,
                    got = envelope.i,
                    cid = %envelope.cid,
                    "Discarding unrelated reply"
                );
                continue;
            }

            let payload = match envelope.open(key) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::debug!(from = %from, seq, error = %e, "Discarding undecodable reply");
                    rejected = Some(e);
                    continue;
                }
            };

            if !expected.labels(&payload) {
                tracing::debug!(
                    from = %from,
                    seq,
                    expected = expected.as_str(),
                    got = ?payload.get("t"),
                    "Discarding reply of another kind"
                );
                continue;
            }

            match parse(payload) {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    tracing::debug!(from = %from, seq, error = %e, "Discarding malformed reply");
                    rejected = Some(e);
                }
            }
        }
    }
}

impl Default for SyncClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

/// Pairs the `cols` and `dat` lists of a status reply.
fn zip_status(reply: &Payload) -> Result<HashMap<String, Value>, CodecError> {
    let cols = reply
        .get("cols")
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::MissingField("cols".to_string()))?;
    let dat = reply
        .get("dat")
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::MissingField("dat".to_string()))?;

    if cols.len() != dat.len() {
        return Err(CodecError::MissingField("dat".to_string()));
    }

    cols.iter()
        .zip(dat)
        .map(|(col, value)| {
            col.as_str()
                .map(|code| (code.to_string(), value.clone()))
                .ok_or_else(|| CodecError::MissingField("cols".to_string()))
        })
        .collect()
}
