//! Port traits: the hexagonal boundary between the pipeline and the outside world.
//!
//! ```text
//!   GpioPort / I2c ──▶ SensorPort ──▶ Sampler ──▶ Queue ──▶ Publisher ──▶ PublishPort
//!                                                               ▲
//!                                                    LinkPort ──┘ (pause / resume)
//! ```
//!
//! Driven adapters implement these traits.  The pipeline consumes them via
//! generics, so the sampling and delivery logic never touches hardware
//! directly and runs unchanged against the simulated wire on the host.

use embedded_hal::digital::PinState;

use crate::error::SensorError;
use crate::sensors::Reading;

// ───────────────────────────────────────────────────────────────
// GPIO port (single-wire line)
// ───────────────────────────────────────────────────────────────

/// Direction of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// High-impedance input; the external pull-up holds the line high.
    Input,
    /// Push-pull output driven by the host.
    Output,
}

/// Raw GPIO access for bit-banged protocols.
///
/// The busy microsecond delay comes from [`embedded_hal::delay::DelayNs`],
/// which single-wire adapters implement alongside this trait so that the
/// delay and the line share one clock.
pub trait GpioPort {
    fn set_direction(&mut self, pin: i32, mode: PinMode);
    fn set_level(&mut self, pin: i32, level: PinState);
    fn get_level(&mut self, pin: i32) -> PinState;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → pipeline)
// ───────────────────────────────────────────────────────────────

/// A sensor that can be sampled once per scheduling period.
///
/// `sample` is all-or-nothing: it returns a complete, validated reading or
/// the kind of failure.  Implementations must bound their own run time.
pub trait SensorPort {
    /// The typed reading produced on success.
    type Reading: Copy + Send + 'static;

    /// Short tag used in log lines (e.g. `"DHT22"`).
    fn name(&self) -> &'static str;

    /// Perform one complete acquisition.
    fn sample(&mut self) -> Result<Self::Reading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: pipeline → downstream transport)
// ───────────────────────────────────────────────────────────────

/// Downstream sink for validated readings.
///
/// Topic naming, payload encoding and delivery guarantees belong to the
/// adapter.  The publisher task calls this once per dequeued reading, in
/// queue order.
pub trait PublishPort {
    fn publish(&mut self, reading: &Reading) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (connectivity signal)
// ───────────────────────────────────────────────────────────────

/// Reports whether the uplink is currently usable.
pub trait LinkPort {
    fn is_up(&mut self) -> bool;

    /// Signal strength seen by the last [`is_up`](Self::is_up), if known.
    fn rssi(&self) -> Option<i8> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PublishPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The transport has no session to publish on.
    NotConnected,
    /// The transport refused the payload.
    Rejected,
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Rejected => write!(f, "payload rejected"),
        }
    }
}
