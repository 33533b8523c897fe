//! Climanode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod pipeline;
pub mod sensors;

mod esp_link_shims;

// Host builds take embassy-time's `std` driver for queue receive timeouts.
#[cfg(not(target_os = "espidf"))]
use embassy_time as _;
