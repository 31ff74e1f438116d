// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LAN discovery of fan units.
//!
//! # Discovery Mechanism
//!
//! A `{"t": "scan"}` datagram is broadcast to the unit port. Every unit
//! answers with a `pack` envelope whose payload (encrypted with the generic
//! key on most firmware, plain on some) describes it:
//!
//! ```json
//! {"t": "dev", "mac": "aabbcc112233", "name": "fake unit", "brand": "gree",
//!  "model": "gree", "ver": "V1.1.13", ...}
//! ```
//!
//! Replies are collected until the timeout lapses.
//!
//! # Examples
//!
//! ```no_run
//! use greefan_lib::discovery::{scan, DiscoveryOptions};
//! use greefan_lib::Device;
//! use std::time::Duration;
//!
//! # async fn example() -> greefan_lib::Result<()> {
//! let options = DiscoveryOptions::new().with_timeout(Duration::from_secs(3));
//!
//! for info in scan(&options).await? {
//!     // bind inside the window that follows the scan reply
//!     let device = Device::new(info);
//!     let key = device.negotiate_key().await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::crypto::{PackKey, Payload};
use crate::device::DeviceInfo;
use crate::error::{Error, ProtocolError};
use crate::protocol::envelope::Envelope;
use crate::protocol::{ClientConfig, EnvelopeSocket};

/// Default discovery timeout.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for a discovery scan.
///
/// # Examples
///
/// ```
/// use greefan_lib::discovery::DiscoveryOptions;
/// use std::time::Duration;
///
/// let options = DiscoveryOptions::new()
///     .with_timeout(Duration::from_secs(10))
///     .with_broadcast_addr("192.168.1.255".parse().unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// How long to collect replies.
    timeout: Option<Duration>,
    /// Where the scan is sent.
    broadcast_addr: Option<IpAddr>,
    /// Unit port (default: 7000).
    port: Option<u16>,
    /// Local address of the scan socket.
    local_addr: Option<SocketAddr>,
}

impl DiscoveryOptions {
    /// Creates options with default settings.
    ///
    /// Default timeout is 5 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long replies are collected.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the address the scan is sent to.
    ///
    /// Default is the limited broadcast address `255.255.255.255`. A
    /// subnet broadcast or a single unit address also works.
    #[must_use]
    pub fn with_broadcast_addr(mut self, addr: IpAddr) -> Self {
        self.broadcast_addr = Some(addr);
        self
    }

    /// Sets the unit port.
    ///
    /// Default is 7000.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the local address of the scan socket.
    #[must_use]
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Returns the discovery timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_DISCOVERY_TIMEOUT)
    }

    /// Returns the scan target address.
    #[must_use]
    pub fn broadcast_addr(&self) -> IpAddr {
        self.broadcast_addr
            .unwrap_or(IpAddr::V4(Ipv4Addr::BROADCAST))
    }

    /// Returns the unit port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(ClientConfig::DEFAULT_PORT)
    }

    /// Returns the local address of the scan socket.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
            .unwrap_or(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
    }
}

/// Broadcasts a scan and returns the units that answered.
///
/// Replies that cannot be decoded or carry no mac are skipped; a unit that
/// answers twice is listed once.
///
/// # Errors
///
/// Returns error if the socket cannot be bound or the scan cannot be sent.
pub async fn scan(options: &DiscoveryOptions) -> Result<Vec<DeviceInfo>, Error> {
    let target = SocketAddr::new(options.broadcast_addr(), options.port());
    let timeout = options.timeout();

    tracing::info!(
        target = %target,
        timeout_secs = timeout.as_secs(),
        "Starting device discovery"
    );

    let socket = EnvelopeSocket::bind(options.local_addr(), true).await?;
    socket.send_envelope(&Envelope::scan(), target).await?;

    let deadline = Instant::now() + timeout;
    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    loop {
        let (envelope, from) = match socket.next_envelope(deadline, timeout).await {
            Ok(received) => received,
            Err(ProtocolError::Timeout(_)) => break,
            Err(e) => return Err(e.into()),
        };

        let payload = match envelope.open(PackKey::Generic) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(from = %from, error = %e, "Skipping undecodable scan reply");
                continue;
            }
        };

        let Some(info) = device_info_from_reply(&envelope, &payload, from) else {
            tracing::debug!(from = %from, "Skipping scan reply without mac");
            continue;
        };

        if seen.insert(info.mac().to_string()) {
            tracing::debug!(device = %info, "Discovered device");
            devices.push(info);
        }
    }

    tracing::info!(discovered = devices.len(), "Device discovery completed");
    Ok(devices)
}

/// Builds a [`DeviceInfo`] from a scan reply.
fn device_info_from_reply(
    envelope: &Envelope,
    payload: &Payload,
    from: SocketAddr,
) -> Option<DeviceInfo> {
    let field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    let mac = field("mac")
        .or_else(|| field("cid"))
        .or_else(|| Some(envelope.cid.as_str()).filter(|s| !s.is_empty()))?;

    let mut info = DeviceInfo::new(from.ip(), mac).with_port(from.port());
    if let Some(name) = field("name") {
        info = info.with_name(name);
    }
    if let Some(brand) = field("brand") {
        info = info.with_brand(brand);
    }
    if let Some(model) = field("model") {
        info = info.with_model(model);
    }
    if let Some(ver) = field("ver") {
        info = info.with_version(ver.trim_start_matches(['V', 'v']));
    }
    Some(info)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(cid: &str) -> Envelope {
        Envelope {
            cid: cid.to_string(),
            ..Envelope::request(1, "", String::new())
        }
    }

    fn payload(value: Value) -> Payload {
        value.as_object().unwrap().clone()
    }

    fn from() -> SocketAddr {
        "192.168.1.40:7000".parse().unwrap()
    }

    #[test]
    fn discovery_options_default() {
        let options = DiscoveryOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(5));
        assert_eq!(options.port(), 7000);
        assert_eq!(options.broadcast_addr(), IpAddr::V4(Ipv4Addr::BROADCAST));
    }

    #[test]
    fn discovery_options_chained() {
        let options = DiscoveryOptions::new()
            .with_timeout(Duration::from_secs(15))
            .with_broadcast_addr("10.0.0.255".parse().unwrap())
            .with_port(7001);

        assert_eq!(options.timeout(), Duration::from_secs(15));
        assert_eq!(options.broadcast_addr().to_string(), "10.0.0.255");
        assert_eq!(options.port(), 7001);
    }

    #[test]
    fn reply_fields_become_device_info() {
        let info = device_info_from_reply(
            &envelope("aabbcc112233"),
            &payload(json!({
                "t": "dev",
                "mac": "aabbcc112233",
                "name": "fake unit",
                "brand": "gree",
                "model": "gree",
                "ver": "V1.1.13"
            })),
            from(),
        )
        .unwrap();

        assert_eq!(info.mac(), "aabbcc112233");
        assert_eq!(info.name(), "fake unit");
        assert_eq!(info.brand(), Some("gree"));
        assert_eq!(info.version(), Some("1.1.13"));
        assert_eq!(info.socket_addr(), from());
    }

    #[test]
    fn mac_falls_back_to_envelope_cid() {
        let info =
            device_info_from_reply(&envelope("aabbcc112233"), &payload(json!({"t": "dev"})), from())
                .unwrap();
        assert_eq!(info.mac(), "aabbcc112233");
        assert_eq!(info.name(), "aabbcc112233");
    }

    #[test]
    fn reply_without_any_mac_is_skipped() {
        assert!(device_info_from_reply(&envelope(""), &payload(json!({"t": "dev"})), from()).is_none());
    }
}
