// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP protocol for communicating with fan units.
//!
//! # Layers
//!
//! - [`envelope`]: the JSON envelope every datagram carries
//! - [`EnvelopeSocket`]: a scoped UDP socket sending and receiving envelopes
//!   and running payloads through [`crypto`](crate::crypto)
//! - [`SyncClient`]: bind, status and command exchanges with correlation
//!   and timeouts
//! - [`ClientConfig`]: timeouts and local addressing

mod client;
mod config;
pub mod envelope;
mod socket;

pub use client::SyncClient;
pub use config::ClientConfig;
pub use envelope::{Envelope, MessageKind};
pub use socket::{EnvelopeSocket, Received};
