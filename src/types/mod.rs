// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for fan unit control.
//!
//! # Types
//!
//! - [`Property`] - Properties tracked on the device and their wire codes
//! - [`DeviceKey`] - Session key obtained by binding
//! - [`FanSpeed`] - Fan speed step (1-12)
//! - [`Mode`], [`HorizontalSwing`], [`VerticalSwing`] - Named positions

mod key;
mod position;
mod property;
mod speed;

pub use key::DeviceKey;
pub use position::{HorizontalSwing, Mode, VerticalSwing};
pub use property::Property;
pub use speed::FanSpeed;
