// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP socket carrying envelopes.
//!
//! An [`EnvelopeSocket`] lives for one exchange. It is released when
//! dropped, whether the exchange succeeded, timed out or failed to decode.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::crypto::{self, PackKey, Payload};
use crate::error::{Error, ProtocolError};
use crate::protocol::envelope::Envelope;

/// Largest datagram a unit sends.
const MAX_DATAGRAM: usize = 4096;

/// A received envelope with its decoded payload.
#[derive(Debug, Clone)]
pub struct Received {
    /// The outer envelope.
    pub envelope: Envelope,
    /// The decrypted payload.
    pub payload: Payload,
    /// Where the datagram came from.
    pub from: SocketAddr,
}

/// A UDP socket sending and receiving [`Envelope`]s.
#[derive(Debug)]
pub struct EnvelopeSocket {
    socket: UdpSocket,
}

impl EnvelopeSocket {
    /// Binds a socket on `local`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the socket cannot be bound or
    /// broadcast cannot be enabled.
    pub async fn bind(local: SocketAddr, broadcast: bool) -> Result<Self, ProtocolError> {
        let socket = UdpSocket::bind(local).await?;
        if broadcast {
            socket.set_broadcast(true)?;
        }
        tracing::trace!(local = %local, broadcast, "Bound envelope socket");
        Ok(Self { socket })
    }

    /// Returns the bound local address.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ProtocolError> {
        Ok(self.socket.local_addr()?)
    }

    /// Sends an envelope as one datagram.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the send fails.
    pub async fn send_envelope(&self, envelope: &Envelope, target: SocketAddr) -> Result<(), Error> {
        let bytes = envelope.to_bytes()?;
        self.socket
            .send_to(&bytes, target)
            .await
            .map_err(ProtocolError::Io)?;
        tracing::trace!(target = %target, seq = envelope.i, len = bytes.len(), "Sent datagram");
        Ok(())
    }

    /// Encrypts `payload` and sends it to `target` inside a request
    /// envelope with sequence number `seq`.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption, serialization or the send fails.
    pub async fn send(
        &self,
        seq: u32,
        tcid: &str,
        payload: &Payload,
        key: PackKey<'_>,
        target: SocketAddr,
    ) -> Result<(), Error> {
        let blob = crypto::encrypt(payload, key)?;
        self.send_envelope(&Envelope::request(seq, tcid, blob), target)
            .await
    }

    /// Waits for the next well-formed envelope until `deadline`.
    ///
    /// Datagrams that do not parse as an envelope are dropped and the read
    /// continues.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Timeout` at the deadline, or
    /// `ProtocolError::Io` if the socket fails.
    pub async fn next_envelope(
        &self,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<(Envelope, SocketAddr), ProtocolError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, from) = tokio::time::timeout_at(deadline, self.socket.recv_from(&mut buf))
                .await
                .map_err(|_| ProtocolError::Timeout(millis(timeout)))??;

            if let Some(envelope) = Envelope::from_bytes(&buf[..len]) {
                return Ok((envelope, from));
            }
            tracing::debug!(from = %from, len, "Discarding malformed datagram");
        }
    }

    /// Waits up to `timeout` for one envelope and decrypts its payload with
    /// `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceTimeout` if nothing arrives in time and
    /// `Error::Decode` if the payload cannot be decrypted.
    pub async fn receive(&self, key: PackKey<'_>, timeout: Duration) -> Result<Received, Error> {
        let (envelope, from) = self
            .next_envelope(Instant::now() + timeout, timeout)
            .await?;
        let payload = envelope.open(key)?;
        Ok(Received {
            envelope,
            payload,
            from,
        })
    }
}

/// Converts a duration to whole milliseconds for error reporting.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use serde_json::json;

    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn send_and_receive_round_trip() {
        let a = EnvelopeSocket::bind(loopback(), false).await.unwrap();
        let b = EnvelopeSocket::bind(loopback(), false).await.unwrap();
        let payload = json!({"t": "status", "cols": ["Pow"]})
            .as_object()
            .unwrap()
            .clone();

        a.send(3, "aabbcc112233", &payload, PackKey::Generic, b.local_addr().unwrap())
            .await
            .unwrap();

        let received = b
            .receive(PackKey::Generic, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(received.envelope.i, 3);
        assert_eq!(received.envelope.tcid, "aabbcc112233");
        assert_eq!(received.payload, payload);
        assert_eq!(received.from, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn receive_times_out() {
        let socket = EnvelopeSocket::bind(loopback(), false).await.unwrap();
        let err = socket
            .receive(PackKey::Generic, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeviceTimeout(50)));
    }

    #[tokio::test]
    async fn malformed_datagrams_are_skipped() {
        let a = UdpSocket::bind(loopback()).await.unwrap();
        let b = EnvelopeSocket::bind(loopback(), false).await.unwrap();
        let target = b.local_addr().unwrap();

        a.send_to(b"not json", target).await.unwrap();
        a.send_to(br#"{"t":"pack","i":9,"pack":{"t":"dev"}}"#, target)
            .await
            .unwrap();

        let received = b
            .receive(PackKey::Generic, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(received.envelope.i, 9);
    }

    #[tokio::test]
    async fn undecryptable_payload_is_a_decode_error() {
        let a = UdpSocket::bind(loopback()).await.unwrap();
        let b = EnvelopeSocket::bind(loopback(), false).await.unwrap();

        a.send_to(
            br#"{"t":"pack","i":1,"pack":"AAAAAAAAAAAAAAAAAAAAAA=="}"#,
            b.local_addr().unwrap(),
        )
        .await
        .unwrap();

        let err = b
            .receive(PackKey::Generic, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
