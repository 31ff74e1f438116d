// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! [`DeviceState`] holds the last known property values of a unit together
//! with the properties changed locally and not yet pushed. [`SystemInfo`]
//! holds the firmware identification the unit reports.
//!
//! # Examples
//!
//! ```
//! use greefan_lib::state::DeviceState;
//! use greefan_lib::types::Property;
//!
//! let mut state = DeviceState::new();
//! state.set(Property::FanSpeed, 4);
//!
//! let pending = state.take_dirty();
//! assert_eq!(pending, vec![(Property::FanSpeed, 4)]);
//! assert!(!state.is_dirty());
//! ```

mod device_state;
mod system_info;

pub use device_state::DeviceState;
pub use system_info::{SystemInfo, extract_firmware_version};
