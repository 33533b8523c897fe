//! Pulse-width measurement for bit-banged single-wire protocols.
//!
//! The line is busy-polled at 1 µs granularity.  A scheduled sleep cannot
//! resolve the tens-of-microseconds windows these protocols use, so the
//! poll loop is deliberate; the caller bounds total run time by choosing
//! the per-hold timeout.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::app::ports::GpioPort;
use crate::error::SensorError;

/// Polling granularity (µs).
pub const POLL_STEP_US: u32 = 1;

/// Measure how long `pin` stays at `expected`.
///
/// Returns the hold time in microseconds as soon as the line leaves
/// `expected`.  A hold of exactly `timeout_us` is accepted; anything longer
/// yields [`SensorError::Timeout`] without waiting for the flip.  If the line
/// is not at `expected` on entry the hold is zero.
pub fn measure_hold<L>(
    line: &mut L,
    pin: i32,
    expected: PinState,
    timeout_us: u32,
) -> Result<u32, SensorError>
where
    L: GpioPort + DelayNs,
{
    let mut elapsed_us = 0;
    while line.get_level(pin) == expected {
        if elapsed_us >= timeout_us {
            return Err(SensorError::Timeout);
        }
        elapsed_us += POLL_STEP_US;
        line.delay_us(POLL_STEP_US);
    }
    Ok(elapsed_us)
}
