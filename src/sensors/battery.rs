//! MAX17048 fuel gauge (I2C).
//!
//! Every register is 16 bits, big-endian, read with a register-pointer
//! write followed by a repeated-start 2-byte read.  Transactions are retried
//! a bounded number of times with a short busy delay; the windows are well
//! under a millisecond so the task does not yield between attempts.
//!
//! Conversions:
//! - `VCELL`: 78.125 µV/LSB, i.e. `raw / (65536 / 5.12)` volts.
//! - `SOC`: high byte is whole percent, low byte is 1/256 percent.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{info, warn};

use super::BatteryReading;
use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::error::SensorError;

/// Factory-default 7-bit address.
pub const MAX17048_ADDR: u8 = 0x36;

/// Cell voltage register.
pub const REG_VCELL: u8 = 0x02;
/// State-of-charge register.
pub const REG_SOC: u8 = 0x04;
/// Production version register.
pub const REG_VERSION: u8 = 0x08;

/// ADC full scale of `VCELL` (volts), specific to the MAX17048.
const VCELL_FULL_SCALE_V: f32 = 5.12;

// ───────────────────────────────────────────────────────────────
// Retry policy
// ───────────────────────────────────────────────────────────────

/// Bounded retry with a fixed busy delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.  Zero behaves as one.
    pub attempts: u8,
    /// Delay between consecutive attempts (µs).
    pub delay_us: u32,
}

impl RetryPolicy {
    /// Register reads.
    pub const REGISTER: Self = Self {
        attempts: 3,
        delay_us: 500,
    };

    /// Bus probes.
    pub const PROBE: Self = Self {
        attempts: 3,
        delay_us: 1000,
    };

    /// Run `op` until it succeeds or the budget is spent.  Returns the last
    /// error on exhaustion.  The budget is local to this call.
    pub fn run<T, E, D>(&self, delay: &mut D, mut op: impl FnMut() -> Result<T, E>) -> Result<T, E>
    where
        D: DelayNs,
    {
        let mut attempt: u8 = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(_) => {
                    attempt += 1;
                    delay.delay_us(self.delay_us);
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Driver
// ───────────────────────────────────────────────────────────────

/// MAX17048 driver over any `embedded-hal` I2C bus.
pub struct FuelGauge<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    register_retry: RetryPolicy,
    probe_retry: RetryPolicy,
}

impl<I, D> FuelGauge<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            register_retry: RetryPolicy::REGISTER,
            probe_retry: RetryPolicy::PROBE,
        }
    }

    /// Build with address and retry budgets taken from `config`.
    pub fn from_config(i2c: I, delay: D, config: &SystemConfig) -> Self {
        Self::new(i2c, delay, config.gauge_address).with_retry(
            RetryPolicy {
                attempts: config.register_attempts,
                delay_us: config.register_retry_delay_us,
            },
            RetryPolicy {
                attempts: config.probe_attempts,
                delay_us: config.probe_retry_delay_us,
            },
        )
    }

    pub fn with_retry(mut self, register: RetryPolicy, probe: RetryPolicy) -> Self {
        self.register_retry = register;
        self.probe_retry = probe;
        self
    }

    /// Probe the bus for the gauge.  Must succeed before register reads
    /// are trusted.
    pub fn discover(&mut self) -> Result<(), SensorError> {
        let address = self.address;
        let result = self.probe_retry.run(&mut self.delay, || {
            self.i2c.write(address, &[]).map_err(|e| {
                warn!("BATTERY: monitor not acknowledging ({:?}), retrying", e.kind());
            })
        });
        match result {
            Ok(()) => {
                info!("BATTERY: monitor connected at 0x{:02X}", address);
                Ok(())
            }
            Err(()) => Err(SensorError::DeviceNotFound),
        }
    }

    /// Read one 16-bit register.
    pub fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let address = self.address;
        let mut buf = [0u8; 2];
        self.register_retry
            .run(&mut self.delay, || {
                self.i2c.write_read(address, &[reg], &mut buf).map_err(|e| {
                    warn!(
                        "BATTERY: failed to read register 0x{:02X} ({:?})",
                        reg,
                        e.kind()
                    );
                })
            })
            .map_err(|()| SensorError::DeviceUnresponsive)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Cell voltage in volts.
    pub fn read_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_VCELL)?;
        Ok(vcell_to_volts(raw))
    }

    /// State of charge in percent.
    pub fn read_state_of_charge(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_SOC)?;
        Ok(soc_to_percent(raw))
    }

    /// Production version word.
    pub fn read_version(&mut self) -> Result<u16, SensorError> {
        self.read_register(REG_VERSION)
    }

    /// Voltage and state of charge as one reading.
    pub fn read(&mut self) -> Result<BatteryReading, SensorError> {
        Ok(BatteryReading {
            voltage: self.read_voltage()?,
            state_of_charge: self.read_state_of_charge()?,
        })
    }

    /// Discover the gauge, then log its version and a first reading.
    pub fn bring_up(&mut self) -> Result<BatteryReading, SensorError> {
        self.discover()?;
        let version = self.read_version()?;
        info!("BATTERY: version 0x{:04X}", version);
        let reading = self.read()?;
        info!(
            "BATTERY: voltage {:.2}V, SOC {:.2}%",
            reading.voltage, reading.state_of_charge
        );
        Ok(reading)
    }

    pub fn bus(&self) -> &I {
        &self.i2c
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}

/// `VCELL` raw count to volts.
pub fn vcell_to_volts(raw: u16) -> f32 {
    let divider = 65536.0 / VCELL_FULL_SCALE_V;
    f32::from(raw) / divider
}

/// `SOC` raw word to percent.
pub fn soc_to_percent(raw: u16) -> f32 {
    f32::from(raw >> 8) + f32::from(raw & 0x00FF) / 256.0
}

impl<I, D> SensorPort for FuelGauge<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Reading = BatteryReading;

    fn name(&self) -> &'static str {
        "BATTERY"
    }

    fn sample(&mut self) -> Result<BatteryReading, SensorError> {
        self.read()
    }
}
