// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identity.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::protocol::ClientConfig;

/// Identity and address of a unit.
///
/// Equality compares the identity fields (mac, name, brand, model,
/// version) and ignores the address, so a unit that moved to a new IP is
/// still the same unit.
///
/// # Examples
///
/// ```
/// use greefan_lib::DeviceInfo;
///
/// let info = DeviceInfo::new("192.168.1.40".parse().unwrap(), "aa:bb:cc:11:22:33");
/// assert_eq!(info.name(), "aabbcc112233");
/// assert_eq!(info.port(), 7000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredInfo")]
pub struct DeviceInfo {
    ip: IpAddr,
    port: u16,
    mac: String,
    name: String,
    brand: Option<String>,
    model: Option<String>,
    version: Option<String>,
}

/// Serialized form of [`DeviceInfo`]; read back through the builders so
/// an empty name falls back to the mac.
#[derive(Deserialize)]
struct StoredInfo {
    ip: IpAddr,
    #[serde(default = "default_port")]
    port: u16,
    mac: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

fn default_port() -> u16 {
    ClientConfig::DEFAULT_PORT
}

impl From<StoredInfo> for DeviceInfo {
    fn from(stored: StoredInfo) -> Self {
        Self {
            brand: stored.brand,
            model: stored.model,
            version: stored.version,
            ..Self::new(stored.ip, stored.mac)
                .with_port(stored.port)
                .with_name(stored.name)
        }
    }
}

impl DeviceInfo {
    /// Creates an identity on the default port, named after its mac.
    #[must_use]
    pub fn new(ip: IpAddr, mac: impl Into<String>) -> Self {
        let mac = mac.into();
        Self {
            ip,
            port: ClientConfig::DEFAULT_PORT,
            name: default_name(&mac),
            mac,
            brand: None,
            model: None,
            version: None,
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the display name. An empty name keeps the mac-derived default.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() {
            default_name(&self.mac)
        } else {
            name
        };
        self
    }

    /// Sets the brand.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns the IP address.
    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the address requests are sent to.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Returns the mac, e.g. `aabbcc112233`.
    #[must_use]
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the brand, if known.
    #[must_use]
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    /// Returns the model, if known.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the firmware version, if known.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

fn default_name(mac: &str) -> String {
    mac.replace(':', "")
}

impl PartialEq for DeviceInfo {
    fn eq(&self, other: &Self) -> bool {
        self.mac == other.mac
            && self.name == other.name
            && self.brand == other.brand
            && self.model == other.model
            && self.version == other.version
    }
}

impl Eq for DeviceInfo {}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device: {} @ {}:{} (mac: {})",
            self.name, self.ip, self.port, self.mac
        )
    }
}
