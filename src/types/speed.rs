// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed type.
//!
//! Use [`FanSpeed`] with [`Device::set_fan_speed()`](crate::Device::set_fan_speed).

use std::fmt;

use crate::error::ValueError;

/// Fan speed step (1-12).
///
/// # Examples
///
/// ```
/// use greefan_lib::types::FanSpeed;
///
/// let speed = FanSpeed::new(6).unwrap();
/// assert_eq!(speed.value(), 6);
///
/// assert!(FanSpeed::new(0).is_err());
/// assert!(FanSpeed::new(13).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FanSpeed(u8);

impl FanSpeed {
    /// Slowest step.
    pub const MIN: u8 = 1;

    /// Fastest step.
    pub const MAX: u8 = 12;

    /// Slowest speed.
    pub const SLOWEST: Self = Self(Self::MIN);

    /// Fastest speed.
    pub const FASTEST: Self = Self(Self::MAX);

    /// Creates a new fan speed.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [1, 12].
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
                actual: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a fan speed, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Returns the speed step.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for FanSpeed {
    type Error = ValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let step = u8::try_from(value).map_err(|_| ValueError::OutOfRange {
            min: i64::from(Self::MIN),
            max: i64::from(Self::MAX),
            actual: value,
        })?;
        Self::new(step)
    }
}

impl From<FanSpeed> for i64 {
    fn from(speed: FanSpeed) -> Self {
        i64::from(speed.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_speed_valid() {
        for v in 1..=12 {
            assert_eq!(FanSpeed::new(v).unwrap().value(), v);
        }
    }

    #[test]
    fn fan_speed_invalid() {
        assert!(FanSpeed::new(0).is_err());
        assert!(FanSpeed::new(13).is_err());
    }

    #[test]
    fn fan_speed_clamped() {
        assert_eq!(FanSpeed::clamped(0).value(), 1);
        assert_eq!(FanSpeed::clamped(40).value(), 12);
        assert_eq!(FanSpeed::clamped(7).value(), 7);
    }

    #[test]
    fn fan_speed_from_wire_value() {
        assert_eq!(FanSpeed::try_from(3_i64).unwrap(), FanSpeed::new(3).unwrap());
        assert_eq!(
            FanSpeed::try_from(-1_i64),
            Err(ValueError::OutOfRange {
                min: 1,
                max: 12,
                actual: -1
            })
        );
        assert_eq!(i64::from(FanSpeed::FASTEST), 12);
    }
}
