// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level device abstraction.
//!
//! A [`Device`] owns one unit's session: its binding key, the property
//! cache and the set of properties changed locally. Setters only touch the
//! cache; [`Device::push_state_update`] sends the changes and
//! [`Device::update_state`] refreshes the cache from the unit.
//!
//! ```no_run
//! use greefan_lib::{Device, DeviceInfo};
//! use greefan_lib::types::FanSpeed;
//!
//! # async fn example() -> greefan_lib::Result<()> {
//! let info = DeviceInfo::new("192.168.1.40".parse().unwrap(), "aabbcc112233");
//! let device = Device::new(info);
//!
//! device.update_state().await?;
//! device.set_power(true);
//! device.set_fan_speed(FanSpeed::new(5)?);
//! device.push_state_update().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Binding
//!
//! A unit only answers encrypted requests once bound. Binding happens in
//! one of two ways:
//!
//! - [`Device::negotiate_key`] runs the handshake. Units only accept it
//!   shortly after they answered a scan, so call it right after
//!   [`discovery::scan`](crate::discovery::scan).
//! - [`Device::bind_with_key`] reuses a key stored from an earlier
//!   handshake and sends nothing.
//!
//! Operations that need a key bind on demand through the handshake.

mod info;

pub use info::DeviceInfo;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::binding::Binding;
use crate::error::Error;
use crate::protocol::{ClientConfig, SyncClient};
use crate::state::{DeviceState, SystemInfo};
use crate::types::{DeviceKey, FanSpeed, HorizontalSwing, Mode, Property, VerticalSwing};

/// Status codes read to identify the firmware.
const VERSION_CODES: [&str; 2] = ["hid", "time"];

/// A fan unit on the local network.
///
/// Network operations on one device run one at a time. Property setters
/// never wait and may be called while a push is in flight; such a change
/// stays dirty for the next push.
#[derive(Debug)]
pub struct Device {
    info: DeviceInfo,
    client: SyncClient,
    session: Mutex<Binding>,
    state: RwLock<DeviceState>,
    system: RwLock<SystemInfo>,
    span: tracing::Span,
}

impl Device {
    /// Creates an unbound device with the default configuration.
    #[must_use]
    pub fn new(info: DeviceInfo) -> Self {
        Self::with_config(info, ClientConfig::default())
    }

    /// Creates an unbound device with a custom configuration.
    #[must_use]
    pub fn with_config(info: DeviceInfo, config: ClientConfig) -> Self {
        let span = tracing::info_span!("greefan_device", mac = %info.mac(), ip = %info.ip());
        Self {
            info,
            client: SyncClient::new(config),
            session: Mutex::new(Binding::new()),
            state: RwLock::new(DeviceState::new()),
            system: RwLock::new(SystemInfo::default()),
            span,
        }
    }

    /// Returns the device identity.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Returns the firmware identification read so far.
    #[must_use]
    pub fn system_info(&self) -> SystemInfo {
        self.system.read().clone()
    }

    /// Returns a snapshot of the property cache.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state.read().clone()
    }

    /// Returns the properties awaiting a push.
    #[must_use]
    pub fn dirty(&self) -> Vec<Property> {
        self.state.read().dirty().to_vec()
    }

    /// Returns `true` if a key is held.
    pub async fn is_bound(&self) -> bool {
        self.session.lock().await.is_bound()
    }

    /// Returns the key in use, for storing and passing to
    /// [`bind_with_key`](Self::bind_with_key) later.
    pub async fn device_key(&self) -> Option<DeviceKey> {
        self.session.lock().await.key().cloned()
    }

    // ========== Binding ==========

    /// Binds with `key` if given, otherwise runs the handshake.
    ///
    /// An empty key counts as no key.
    ///
    /// # Errors
    ///
    /// See [`bind_with_key`](Self::bind_with_key) and
    /// [`negotiate_key`](Self::negotiate_key).
    pub async fn bind(&self, key: Option<DeviceKey>) -> Result<(), Error> {
        match key {
            Some(key) if !key.is_empty() => self.bind_with_key(key).await,
            _ => self.negotiate_key().await.map(|_| ()),
        }
    }

    /// Uses a previously negotiated key. Nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotBound` if the device has no mac or the key
    /// is empty.
    pub async fn bind_with_key(&self, key: DeviceKey) -> Result<(), Error> {
        if self.info.mac().is_empty() || key.is_empty() {
            return Err(Error::DeviceNotBound);
        }
        self.session.lock().await.accept_key(key);
        self.span.in_scope(|| tracing::info!("Bound to device using a stored key"));
        Ok(())
    }

    /// Runs the bind handshake and keeps the negotiated key.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotBound` if the device has no mac or the reply
    ///   carries no key
    /// - `Error::DeviceTimeout` if the device does not answer
    pub async fn negotiate_key(&self) -> Result<DeviceKey, Error> {
        async {
            tracing::info!(device = %self.info, "Starting device binding");
            let mut session = self.session.lock().await;
            self.client.negotiate_key(&self.info, &mut session).await
        }
        .instrument(self.span.clone())
        .await
    }

    // ========== Synchronization ==========

    /// Reads the hardware id and device clock and extracts the firmware
    /// version from the hardware id.
    ///
    /// A hardware id without a recognizable version leaves the version
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceTimeout` or `Error::Decode` if the exchange
    /// fails.
    pub async fn request_version(&self) -> Result<SystemInfo, Error> {
        async {
            let mut session = self.session.lock().await;
            self.request_version_locked(&mut session).await
        }
        .instrument(self.span.clone())
        .await
    }

    async fn request_version_locked(&self, session: &mut Binding) -> Result<SystemInfo, Error> {
        let report = self
            .client
            .pull_properties(&VERSION_CODES, &self.info, session)
            .await?;

        let info = SystemInfo::from_report(
            report.get("hid").and_then(Value::as_str),
            report.get("time").and_then(Value::as_str),
        );
        tracing::debug!(
            hid = ?info.hardware_id(),
            version = ?info.firmware_version(),
            "Read firmware identification"
        );
        self.system.write().clone_from(&info);
        Ok(info)
    }

    /// Binds if needed, then reads every known property into the cache.
    ///
    /// Properties with a pending local change keep the local value. The
    /// first successful update also reads the firmware identification.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotBound`, `Error::DeviceTimeout` or
    /// `Error::Decode` if binding or the exchange fails. The cache is left
    /// untouched on error.
    pub async fn update_state(&self) -> Result<(), Error> {
        async {
            let mut session = self.session.lock().await;
            if !session.is_bound() {
                self.client.negotiate_key(&self.info, &mut session).await?;
            }

            tracing::debug!(device = %self.info, "Updating device properties");
            let codes = Property::all_codes();
            let report = self
                .client
                .pull_properties(&codes, &self.info, &mut session)
                .await?;

            let reported = report.iter().filter_map(|(code, value)| {
                let property = code.parse::<Property>().ok()?;
                match as_property_value(value) {
                    Some(v) => Some((property, v)),
                    None => {
                        tracing::debug!(code = %code, value = %value, "Ignoring non-integer value");
                        None
                    }
                }
            });
            self.state.write().merge_reported(reported);

            let needs_version = self.system.read().hardware_id().is_none();
            if needs_version {
                self.request_version_locked(&mut session).await?;
            }
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Sends every locally changed property to the device.
    ///
    /// Does nothing, and sends nothing, when no property is dirty. The
    /// dirty set is cleared before the command is sent and is not restored
    /// if the command fails; a property changed while the command is in
    /// flight is dirty again afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotBound` if binding fails (the dirty set is
    /// kept) and `Error::DeviceTimeout` if the device does not acknowledge
    /// (the dirty set stays cleared).
    pub async fn push_state_update(&self) -> Result<(), Error> {
        let dirty = self.state.read().is_dirty();
        if !dirty {
            return Ok(());
        }

        async {
            let mut session = self.session.lock().await;
            if !session.is_bound() {
                self.client.negotiate_key(&self.info, &mut session).await?;
            }

            let pending = self.state.write().take_dirty();
            if pending.is_empty() {
                return Ok(());
            }

            tracing::debug!(device = %self.info, "Pushing state updates");
            for (property, value) in &pending {
                tracing::debug!(code = %property, value, "Sending remote state update");
            }

            let values: Vec<(&str, i64)> = pending.iter().map(|(p, v)| (p.code(), *v)).collect();
            self.client
                .push_properties(&values, &self.info, &mut session)
                .await
        }
        .instrument(self.span.clone())
        .await
    }

    // ========== Properties ==========

    /// Returns the cached value of a property.
    #[must_use]
    pub fn get_property(&self, property: Property) -> Option<i64> {
        self.state.read().get(property)
    }

    /// Sets a property locally and marks it dirty if the value changed.
    ///
    /// Returns `true` if the value changed.
    pub fn set_property(&self, property: Property, value: i64) -> bool {
        self.state.write().set(property, value)
    }

    /// Returns `true` if the unit is on. Unknown reads as off.
    #[must_use]
    pub fn power(&self) -> bool {
        self.get_property(Property::Power).is_some_and(|v| v != 0)
    }

    /// Turns the unit on or off.
    pub fn set_power(&self, on: bool) {
        self.set_property(Property::Power, i64::from(on));
    }

    /// Returns the operating mode, see [`Mode`].
    #[must_use]
    pub fn mode(&self) -> Option<i64> {
        self.get_property(Property::Mode)
    }

    /// Sets the operating mode.
    pub fn set_mode(&self, mode: Mode) {
        self.set_property(Property::Mode, mode.into());
    }

    /// Returns the fan speed step, see [`FanSpeed`].
    #[must_use]
    pub fn fan_speed(&self) -> Option<i64> {
        self.get_property(Property::FanSpeed)
    }

    /// Sets the fan speed.
    pub fn set_fan_speed(&self, speed: FanSpeed) {
        self.set_property(Property::FanSpeed, speed.into());
    }

    /// Returns the horizontal swing position, see [`HorizontalSwing`].
    #[must_use]
    pub fn horizontal_swing(&self) -> Option<i64> {
        self.get_property(Property::HorizontalSwing)
    }

    /// Sets the horizontal swing position.
    pub fn set_horizontal_swing(&self, swing: HorizontalSwing) {
        self.set_property(Property::HorizontalSwing, swing.into());
    }

    /// Returns the vertical swing position, see [`VerticalSwing`].
    #[must_use]
    pub fn vertical_swing(&self) -> Option<i64> {
        self.get_property(Property::VerticalSwing)
    }

    /// Sets the vertical swing position.
    pub fn set_vertical_swing(&self, swing: VerticalSwing) {
        self.set_property(Property::VerticalSwing, swing.into());
    }
}

/// Converts a reported status value to a property value.
fn as_property_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use serde_json::json;

    use super::*;

    fn device() -> Device {
        Device::new(DeviceInfo::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            "aabbcc112233",
        ))
    }

    #[test]
    fn setting_same_value_twice_dirties_once() {
        let device = device();
        device.set_property(Property::Power, 1);
        device.set_property(Property::Power, 1);
        assert_eq!(device.dirty(), vec![Property::Power]);
    }

    #[test]
    fn typed_accessors_read_through_cache() {
        let device = device();
        assert!(!device.power());
        assert!(device.mode().is_none());

        device.set_power(true);
        device.set_mode(Mode::Sleep);
        device.set_fan_speed(FanSpeed::new(7).unwrap());
        device.set_horizontal_swing(HorizontalSwing::D100);
        device.set_vertical_swing(VerticalSwing::Default);

        assert!(device.power());
        assert_eq!(device.mode(), Some(1));
        assert_eq!(device.fan_speed(), Some(7));
        assert_eq!(device.horizontal_swing(), Some(2));
        assert_eq!(device.vertical_swing(), Some(0));
        assert_eq!(device.dirty().len(), 5);
    }

    #[test]
    fn status_values_convert_to_integers() {
        assert_eq!(as_property_value(&json!(3)), Some(3));
        assert_eq!(as_property_value(&json!(true)), Some(1));
        assert_eq!(as_property_value(&json!("12")), Some(12));
        assert_eq!(as_property_value(&json!("on")), None);
        assert_eq!(as_property_value(&json!(null)), None);
    }

    #[tokio::test]
    async fn empty_push_is_a_noop() {
        // unbound and nothing dirty: no handshake, no error
        let device = device();
        device.push_state_update().await.unwrap();
        assert!(!device.is_bound().await);
    }

    #[tokio::test]
    async fn bind_with_key_needs_identity() {
        let device = Device::new(DeviceInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), ""));
        let err = device.bind_with_key(DeviceKey::new("k")).await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotBound));

        let err = device.bind(None).await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotBound));

        let err = device.bind(Some(DeviceKey::new(""))).await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotBound));
    }

    #[tokio::test]
    async fn bind_with_empty_key_fails() {
        let device = device();
        let err = device.bind_with_key(DeviceKey::new("")).await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotBound));
        assert!(!device.is_bound().await);
    }
}
