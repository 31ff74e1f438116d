// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property cache with dirty tracking.

use std::collections::HashMap;

use crate::types::Property;

/// Last known property values and the properties changed locally.
///
/// Every dirty property is present in the cache. Dirty order follows the
/// order of the first local change and holds no duplicates.
///
/// # Examples
///
/// ```
/// use greefan_lib::state::DeviceState;
/// use greefan_lib::types::Property;
///
/// let mut state = DeviceState::new();
/// assert!(state.set(Property::Power, 1));
/// assert!(!state.set(Property::Power, 1));
/// assert_eq!(state.dirty(), &[Property::Power]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    values: HashMap<Property, i64>,
    dirty: Vec<Property>,
}

impl DeviceState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value of a property.
    #[must_use]
    pub fn get(&self, property: Property) -> Option<i64> {
        self.values.get(&property).copied()
    }

    /// Sets a property locally.
    ///
    /// Returns `false` and changes nothing if the cached value is already
    /// `value`; otherwise updates the cache, marks the property dirty and
    /// returns `true`.
    pub fn set(&mut self, property: Property, value: i64) -> bool {
        if self.values.get(&property) == Some(&value) {
            return false;
        }
        self.values.insert(property, value);
        if !self.dirty.contains(&property) {
            self.dirty.push(property);
        }
        true
    }

    /// Returns the properties awaiting a push.
    #[must_use]
    pub fn dirty(&self) -> &[Property] {
        &self.dirty
    }

    /// Returns `true` if any property awaits a push.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Clears the dirty set, returning the pending values in dirty order.
    pub fn take_dirty(&mut self) -> Vec<(Property, i64)> {
        std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|p| self.values.get(&p).map(|&v| (p, v)))
            .collect()
    }

    /// Merges values reported by the device.
    ///
    /// Dirty properties keep their local value so a pull between a local
    /// change and its push does not revert the change. Returns `true` if any
    /// cached value changed.
    pub fn merge_reported<I>(&mut self, reported: I) -> bool
    where
        I: IntoIterator<Item = (Property, i64)>,
    {
        let mut changed = false;
        for (property, value) in reported {
            if self.dirty.contains(&property) {
                continue;
            }
            if self.values.insert(property, value) != Some(value) {
                changed = true;
            }
        }
        changed
    }

    /// Returns all cached values.
    #[must_use]
    pub fn values(&self) -> &HashMap<Property, i64> {
        &self.values
    }

    /// Clears all state, resetting to unknown.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
