// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Configuration for talking to a unit.
///
/// # Examples
///
/// ```
/// use greefan_lib::protocol::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new().with_timeout(Duration::from_secs(2));
/// assert_eq!(config.timeout(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    timeout: Duration,
    local_addr: SocketAddr,
}

impl ClientConfig {
    /// Port units listen on.
    pub const DEFAULT_PORT: u16 = 7000;
    /// Default read timeout for one exchange.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read timeout for one exchange.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the local address exchange sockets bind to.
    #[must_use]
    pub fn with_local_addr(mut self, local_addr: SocketAddr) -> Self {
        self.local_addr = local_addr;
        self
    }

    /// Returns the read timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the local bind address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.local_addr().port(), 0);
        assert!(config.local_addr().ip().is_unspecified());
    }

    #[test]
    fn chained_builders() {
        let local: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = ClientConfig::new()
            .with_timeout(Duration::from_millis(300))
            .with_local_addr(local);
        assert_eq!(config.timeout(), Duration::from_millis(300));
        assert_eq!(config.local_addr(), local);
    }
}
