//! DHT22 / AM2302 humidity and temperature sensor (single-wire).
//!
//! ```text
//!   host          sensor presence     bit 0              bit 39   end
//!  ──┐     ┌──┐ │ ┌──────┐      ┌───┐      ┌──────┐ ... ┌──┐    ┌──────
//!    └─────┘  └─┘ └80 µs─┘80 µs └50─┘26/70 └50 µs─┘     └──┘    └ idle
//!    3 ms  25µs
//! ```
//!
//! The host wakes the sensor with a long low pulse, requests data with a
//! short high pulse, then releases the line.  The sensor answers with a
//! presence pulse and 40 bits.  Each bit is a ~50 µs low followed by a high
//! whose *length* is the bit: ~26 µs for `0`, ~70 µs for `1`.
//!
//! Frame: humidity (16 bit), temperature (sign + 15 bit magnitude), checksum
//! (low byte of the sum of the first four bytes).  Both values are tenths.
//!
//! Decoding is all-or-nothing.  The first overrun aborts the read; a fully
//! acquired frame with a bad checksum is discarded.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use log::debug;

use super::HumidityReading;
use super::signal::measure_hold;
use crate::app::ports::{GpioPort, PinMode, SensorPort};
use crate::error::SensorError;

/// Bytes per frame (2 humidity, 2 temperature, 1 checksum).
pub const FRAME_BYTES: usize = 5;
/// Bits per frame.
pub const FRAME_BITS: usize = FRAME_BYTES * 8;

// Start signal.
const WAKE_LOW_US: u32 = 3000;
const REQUEST_HIGH_US: u32 = 25;

// Hold timeouts.
const PRESENCE_TIMEOUT_US: u32 = 85;
const BIT_START_TIMEOUT_US: u32 = 56;
const BIT_HIGH_TIMEOUT_US: u32 = 75;

/// High holds strictly longer than this decode to `1`.
pub const ONE_THRESHOLD_US: u32 = 40;

/// Decode one bit from the length of its high phase.
pub const fn bit_from_high_time(high_us: u32) -> bool {
    high_us > ONE_THRESHOLD_US
}

// ───────────────────────────────────────────────────────────────
// Raw frame
// ───────────────────────────────────────────────────────────────

/// The 40 bits of one transmission, packed MSB-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFrame([u8; FRAME_BYTES]);

impl RawFrame {
    pub const fn from_bytes(bytes: [u8; FRAME_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; FRAME_BYTES] {
        self.0
    }

    /// Set bit `index` (0 = MSB of byte 0, 39 = LSB of the checksum).
    pub fn set_bit(&mut self, index: usize, bit: bool) {
        let mask = 0x80 >> (index % 8);
        if bit {
            self.0[index / 8] |= mask;
        } else {
            self.0[index / 8] &= !mask;
        }
    }

    pub fn bit(&self, index: usize) -> bool {
        self.0[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Low 8 bits of the sum of the four data bytes.
    pub fn expected_checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
    }

    pub fn checksum_ok(&self) -> bool {
        self.0[4] == self.expected_checksum()
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f32 {
        f32::from(u16::from_be_bytes([self.0[0], self.0[1]])) / 10.0
    }

    /// Temperature in degrees Celsius.  Bit 7 of byte 2 is the sign.
    pub fn temperature(&self) -> f32 {
        let magnitude = f32::from(u16::from_be_bytes([self.0[2] & 0x7F, self.0[3]])) / 10.0;
        if self.0[2] & 0x80 != 0 { -magnitude } else { magnitude }
    }

    /// Validate the checksum and convert.
    pub fn into_reading(self) -> Result<HumidityReading, SensorError> {
        if !self.checksum_ok() {
            return Err(SensorError::ChecksumError);
        }
        Ok(HumidityReading {
            temperature: self.temperature(),
            humidity: self.humidity(),
        })
    }
}

/// Validate and convert a complete 5-byte frame.
pub fn decode_frame(bytes: [u8; FRAME_BYTES]) -> Result<HumidityReading, SensorError> {
    RawFrame::from_bytes(bytes).into_reading()
}

// ───────────────────────────────────────────────────────────────
// Driver
// ───────────────────────────────────────────────────────────────

/// DHT22 driver over any line that offers raw GPIO access and a busy delay.
pub struct Dht22<L> {
    line: L,
    pin: i32,
}

impl<L> Dht22<L>
where
    L: GpioPort + DelayNs,
{
    pub fn new(line: L, pin: i32) -> Self {
        Self { line, pin }
    }

    /// Run one complete transaction: start signal, presence, 40 bits,
    /// checksum, conversion.
    ///
    /// Busy-polls for the whole frame (about 5 ms at nominal timing).
    pub fn read(&mut self) -> Result<HumidityReading, SensorError> {
        self.send_start_signal();
        self.await_presence()?;
        let frame = self.acquire_frame()?;
        debug!("DHT22: raw frame {:02X?}", frame.bytes());
        frame.into_reading()
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    fn send_start_signal(&mut self) {
        self.line.set_direction(self.pin, PinMode::Output);

        // Long low wakes the sensor.
        self.line.set_level(self.pin, PinState::Low);
        self.line.delay_us(WAKE_LOW_US);

        // Short high requests a measurement.
        self.line.set_level(self.pin, PinState::High);
        self.line.delay_us(REQUEST_HIGH_US);

        self.line.set_direction(self.pin, PinMode::Input);
    }

    fn await_presence(&mut self) -> Result<(), SensorError> {
        self.hold(PinState::Low, PRESENCE_TIMEOUT_US)?;
        self.hold(PinState::High, PRESENCE_TIMEOUT_US)?;
        Ok(())
    }

    fn acquire_frame(&mut self) -> Result<RawFrame, SensorError> {
        let mut frame = RawFrame::default();
        for index in 0..FRAME_BITS {
            self.hold(PinState::Low, BIT_START_TIMEOUT_US)?;
            let high_us = self.hold(PinState::High, BIT_HIGH_TIMEOUT_US)?;
            frame.set_bit(index, bit_from_high_time(high_us));
        }
        Ok(frame)
    }

    fn hold(&mut self, level: PinState, timeout_us: u32) -> Result<u32, SensorError> {
        measure_hold(&mut self.line, self.pin, level, timeout_us)
    }
}

impl<L> SensorPort for Dht22<L>
where
    L: GpioPort + DelayNs,
{
    type Reading = HumidityReading;

    fn name(&self) -> &'static str {
        "DHT22"
    }

    fn sample(&mut self) -> Result<HumidityReading, SensorError> {
        self.read()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
