// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `greefan` Lib - A Rust library to control Gree fan units on the LAN.
//!
//! Units speak a JSON-over-UDP protocol with AES encrypted payloads. This
//! library discovers units, binds to them to obtain a per-unit key, and
//! keeps a local property cache in sync with the unit.
//!
//! # Supported Features
//!
//! - **Discovery**: broadcast scan returning [`DeviceInfo`] records
//! - **Binding**: key handshake, or reuse of a stored key
//! - **State sync**: pull all properties, push only the changed ones
//! - **Firmware identification**: hardware id and firmware version
//!
//! # Quick Start
//!
//! ```no_run
//! use greefan_lib::discovery::{scan, DiscoveryOptions};
//! use greefan_lib::Device;
//! use greefan_lib::types::{FanSpeed, HorizontalSwing};
//!
//! #[tokio::main]
//! async fn main() -> greefan_lib::Result<()> {
//!     let units = scan(&DiscoveryOptions::new()).await?;
//!
//!     for info in units {
//!         let device = Device::new(info);
//!         device.negotiate_key().await?;
//!         device.update_state().await?;
//!
//!         device.set_power(true);
//!         device.set_fan_speed(FanSpeed::new(4)?);
//!         device.set_horizontal_swing(HorizontalSwing::D60);
//!         device.push_state_update().await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Reusing a Key
//!
//! ```no_run
//! use greefan_lib::{Device, DeviceInfo};
//! use greefan_lib::types::DeviceKey;
//!
//! # async fn example() -> greefan_lib::Result<()> {
//! let info = DeviceInfo::new("192.168.1.40".parse().unwrap(), "aabbcc112233");
//! let device = Device::new(info);
//! device.bind_with_key(DeviceKey::new("St8Vw1Yz4Bc7Ef0H")).await?;
//! device.update_state().await?;
//! println!("power: {}", device.power());
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod crypto;
mod device;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod state;
pub mod types;

pub use binding::{BindState, Binding};
pub use device::{Device, DeviceInfo};
pub use error::{CodecError, Error, ProtocolError, Result, ValueError};
pub use protocol::{ClientConfig, SyncClient};
pub use state::{DeviceState, SystemInfo};
pub use types::{DeviceKey, FanSpeed, HorizontalSwing, Mode, Property, VerticalSwing};
