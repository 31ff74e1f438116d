// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode and swing blade positions.
//!
//! The device reports these as plain integers. The enums below name the
//! values the firmware is known to accept; reads on
//! [`Device`](crate::Device) stay integer so unknown values are not lost.

use std::fmt;

use crate::error::ValueError;

/// Defines a position enum with its wire values and conversions.
macro_rules! position_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Returns the value sent on the wire.
            #[must_use]
            pub const fn as_num(&self) -> i64 {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Returns a human readable name.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValueError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(ValueError::InvalidPosition {
                        property: $label,
                        value,
                    }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.as_num()
            }
        }
    };
}

position_enum! {
    /// Operating mode.
    Mode, "mode" {
        /// Automatic mode.
        #[default]
        Auto = 0 => "auto",
        /// Sleep mode.
        Sleep = 1 => "sleep",
    }
}

position_enum! {
    /// Horizontal (left/right) swing range.
    HorizontalSwing, "horizontal swing" {
        /// No swing.
        #[default]
        Off = 0 => "off",
        /// 60 degree sweep.
        D60 = 1 => "60",
        /// 100 degree sweep.
        D100 = 2 => "100",
        /// Full rotation.
        D360 = 3 => "360",
    }
}

position_enum! {
    /// Vertical (up/down) swing position.
    VerticalSwing, "vertical swing" {
        /// Factory default position.
        #[default]
        Default = 0 => "default",
    }
}
