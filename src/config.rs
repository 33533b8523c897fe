//! System configuration parameters
//!
//! All tunable parameters for the acquisition node.  Values are compiled-in
//! defaults; there is no persistent override.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Humidity sensor ---
    /// GPIO number of the single-wire data line.
    pub dht_gpio: i32,
    /// Period between humidity samples (milliseconds).
    pub dht_period_ms: u32,

    // --- Fuel gauge ---
    /// 7-bit I2C address of the fuel gauge.
    pub gauge_address: u8,
    /// I2C bus clock (Hz).
    pub i2c_freq_hz: u32,
    /// Period between battery samples (milliseconds).
    pub battery_period_ms: u32,
    /// Attempts per register read before giving up.
    pub register_attempts: u8,
    /// Busy delay between register read attempts (microseconds).
    pub register_retry_delay_us: u32,
    /// Attempts per bus probe before giving up.
    pub probe_attempts: u8,
    /// Busy delay between bus probe attempts (microseconds).
    pub probe_retry_delay_us: u32,

    // --- Tasks ---
    /// Sampler task priority.
    pub sampler_priority: u8,
    /// Sampler task stack (KiB).
    pub sampler_stack_kb: usize,
    /// Publisher task priority.
    pub publisher_priority: u8,
    /// Publisher task stack (KiB).
    pub publisher_stack_kb: usize,

    // --- Connectivity ---
    /// How often the main loop polls the link state (milliseconds).
    pub link_poll_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Humidity sensor
            dht_gpio: pins::DHT_DATA_GPIO,
            dht_period_ms: 5000, // sensor needs >2 s between reads

            // Fuel gauge (MAX17048)
            gauge_address: 0x36,
            i2c_freq_hz: 400_000,
            battery_period_ms: 5000,
            register_attempts: 3,
            register_retry_delay_us: 500,
            probe_attempts: 3,
            probe_retry_delay_us: 1000,

            // Tasks
            sampler_priority: 4,
            sampler_stack_kb: 6,
            publisher_priority: 5,
            publisher_stack_kb: 8,

            // Connectivity
            link_poll_interval_ms: 1000,
        }
    }
}

impl SystemConfig {
    /// Reject values that would stall or spin the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.dht_period_ms == 0 || self.battery_period_ms == 0 {
            return Err(Error::Config("sample period must be non-zero"));
        }
        if self.register_attempts == 0 || self.probe_attempts == 0 {
            return Err(Error::Config("retry budget must allow at least one attempt"));
        }
        if self.gauge_address > 0x7F {
            return Err(Error::Config("gauge address must be 7-bit"));
        }
        if self.sampler_stack_kb == 0 || self.publisher_stack_kb == 0 {
            return Err(Error::Config("task stack must be non-zero"));
        }
        if self.link_poll_interval_ms == 0 {
            return Err(Error::Config("link poll interval must be non-zero"));
        }
        Ok(())
    }
}
