// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device properties and their wire codes.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A property tracked on the physical device.
///
/// Each property maps to the short code the firmware uses in status and
/// command payloads.
///
/// # Examples
///
/// ```
/// use greefan_lib::types::Property;
///
/// assert_eq!(Property::Power.code(), "Pow");
/// assert_eq!("WdSpd".parse::<Property>().unwrap(), Property::FanSpeed);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Property {
    /// Unit on/off.
    Power,
    /// Operating mode.
    Mode,
    /// Fan speed step.
    FanSpeed,
    /// Left/right blade swing.
    HorizontalSwing,
    /// Up/down blade swing.
    VerticalSwing,
}

impl Property {
    /// Every known property, in the order status requests list them.
    pub const ALL: [Self; 5] = [
        Self::Power,
        Self::Mode,
        Self::FanSpeed,
        Self::HorizontalSwing,
        Self::VerticalSwing,
    ];

    /// Returns the wire code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Power => "Pow",
            Self::Mode => "Mod",
            Self::FanSpeed => "WdSpd",
            Self::HorizontalSwing => "SwingLfRig",
            Self::VerticalSwing => "SwUpDn",
        }
    }

    /// Returns the wire codes of every known property.
    #[must_use]
    pub fn all_codes() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::code).collect()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Property {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.code() == s)
            .ok_or_else(|| ValueError::InvalidCode(s.to_string()))
    }
}
