// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Firmware identification reported by a unit.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Version number between a `V` and the `.bin` suffix of the hardware id.
static FIRMWARE_VERSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"V([\d.]+)\.bin$").ok());

/// Clock format used by the `time` status code.
const DEVICE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Diagnostic information read with the `hid` and `time` status codes.
///
/// # Examples
///
/// ```
/// use greefan_lib::state::SystemInfo;
///
/// let info = SystemInfo::from_report(Some("362001000762+U-CS532AE(LT)V3.31.bin"), None);
/// assert_eq!(info.firmware_version(), Some("3.31"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    hardware_id: Option<String>,
    firmware_version: Option<String>,
    device_time: Option<String>,
}

impl SystemInfo {
    /// Builds the info from the raw `hid` and `time` values.
    #[must_use]
    pub fn from_report(hardware_id: Option<&str>, device_time: Option<&str>) -> Self {
        Self {
            hardware_id: hardware_id.map(str::to_string),
            firmware_version: hardware_id.and_then(extract_firmware_version),
            device_time: device_time.map(str::to_string),
        }
    }

    /// Returns the hardware id, e.g. `362001000762+U-CS532AE(LT)V3.31.bin`.
    #[must_use]
    pub fn hardware_id(&self) -> Option<&str> {
        self.hardware_id.as_deref()
    }

    /// Returns the firmware version extracted from the hardware id.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Returns the device clock as reported.
    #[must_use]
    pub fn device_time_raw(&self) -> Option<&str> {
        self.device_time.as_deref()
    }

    /// Returns the device clock, if it parses.
    #[must_use]
    pub fn device_time(&self) -> Option<NaiveDateTime> {
        self.device_time
            .as_deref()
            .and_then(|t| NaiveDateTime::parse_from_str(t, DEVICE_TIME_FORMAT).ok())
    }
}

/// Extracts the firmware version from a hardware id.
///
/// Returns `None` when the id does not end in `V<version>.bin`.
#[must_use]
pub fn extract_firmware_version(hardware_id: &str) -> Option<String> {
    FIRMWARE_VERSION
        .as_ref()?
        .captures(hardware_id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
