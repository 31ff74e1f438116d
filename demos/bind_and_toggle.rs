// SPDX-License-Identifier: MPL-2.0

//! Test program: discover fan units, bind to the first one and toggle it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example bind_and_toggle -- [broadcast-address] [key]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=greefan_lib=debug cargo run --example bind_and_toggle -- 192.168.1.255
//! ```
//!
//! Passing the key printed by an earlier run skips the handshake.

use std::env;
use std::time::Duration;

use greefan_lib::discovery::{DiscoveryOptions, scan};
use greefan_lib::types::{DeviceKey, FanSpeed};
use greefan_lib::Device;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut options = DiscoveryOptions::new().with_timeout(Duration::from_secs(3));
    if let Some(addr) = args.get(1) {
        options = options.with_broadcast_addr(addr.parse()?);
    }
    let key = args.get(2).map(|k| DeviceKey::new(k.as_str()));

    println!("Scanning for units...");
    let units = scan(&options).await?;
    let Some(info) = units.into_iter().next() else {
        eprintln!("No unit answered the scan");
        std::process::exit(1);
    };
    println!("Found {info}");

    let device = Device::new(info);
    device.bind(key).await?;
    if let Some(key) = device.device_key().await {
        println!("Device key: {}", key.as_str());
    }

    device.update_state().await?;
    let system = device.system_info();
    println!(
        "Firmware: {}",
        system.firmware_version().unwrap_or("unknown")
    );
    println!(
        "Power: {}, speed: {:?}, swing: {:?}",
        device.power(),
        device.fan_speed(),
        device.horizontal_swing()
    );

    let on = !device.power();
    device.set_power(on);
    if on {
        device.set_fan_speed(FanSpeed::new(3)?);
    }
    device.push_state_update().await?;
    println!("Turned unit {}", if on { "on" } else { "off" });

    Ok(())
}
