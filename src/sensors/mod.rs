//! Sensor subsystem: drivers and the typed readings they produce.
//!
//! | Driver     | Bus          | Reading            |
//! |------------|--------------|--------------------|
//! | `dht22`    | single-wire  | [`HumidityReading`]|
//! | `battery`  | I2C          | [`BatteryReading`] |
//!
//! Readings are plain `Copy` values: they are moved by value into a queue
//! slot and destroyed by the publisher once delivered.

pub mod battery;
pub mod dht22;
pub mod signal;

use core::fmt::Write;

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Capacity of a formatted reading line.
pub const LINE_CAP: usize = 64;

/// One validated humidity/temperature measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumidityReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
}

/// One battery measurement from the fuel gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Cell voltage, volts.
    pub voltage: f32,
    /// State of charge, percent (0–100 nominal).
    pub state_of_charge: f32,
}

/// Any reading that can flow to the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Humidity(HumidityReading),
    Battery(BatteryReading),
}

impl From<HumidityReading> for Reading {
    fn from(r: HumidityReading) -> Self {
        Self::Humidity(r)
    }
}

impl From<BatteryReading> for Reading {
    fn from(r: BatteryReading) -> Self {
        Self::Battery(r)
    }
}

impl Reading {
    /// Human-readable one-line summary, formatted without heap allocation.
    pub fn format_line(&self) -> heapless::String<LINE_CAP> {
        let mut line = heapless::String::new();
        // A line that overflows is truncated, never dropped.
        let _ = match self {
            Self::Humidity(r) => write!(
                line,
                "Humidity: {:.2}, temperature: {:.2}\u{00b0}C",
                r.humidity, r.temperature
            ),
            Self::Battery(r) => write!(
                line,
                "Battery voltage: {:.2}V, SOC: {:.2}%",
                r.voltage, r.state_of_charge
            ),
        };
        line
    }
}

/// Log a failed read with its classification.
pub fn log_failure(sensor: &str, err: SensorError) {
    match err {
        SensorError::Timeout => error!("{}: Sensor Timeout", sensor),
        SensorError::ChecksumError => error!("{}: CheckSum error", sensor),
        SensorError::DeviceUnresponsive => error!("{}: device not responding", sensor),
        SensorError::DeviceNotFound => error!("{}: device not found on bus", sensor),
    }
}
