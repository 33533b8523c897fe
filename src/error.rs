//! Unified error types for the Climanode firmware.
//!
//! Sensor failures are plain `Copy` values: they are logged by the sampler
//! that produced them and never leave that task.  Only initialisation and
//! configuration errors travel up to `main`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A task or peripheral could not be brought up.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
    /// A pipeline task terminated abnormally.
    Task(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Task(name) => write!(f, "task '{name}' panicked"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Failure kinds of a single sensor read.
///
/// None of these carry partial data: a read either produces a complete,
/// validated reading or one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorError {
    /// A line-level wait exceeded its microsecond bound.
    Timeout,
    /// The frame was fully acquired but its checksum byte did not match.
    ChecksumError,
    /// A register read exhausted its retry budget.
    DeviceUnresponsive,
    /// Bus probe exhausted its retry budget.
    DeviceNotFound,
}

impl SensorError {
    /// Every variant, in display order.  Used to size per-kind counters.
    pub const ALL: [SensorError; 4] = [
        Self::Timeout,
        Self::ChecksumError,
        Self::DeviceUnresponsive,
        Self::DeviceNotFound,
    ];

    /// Stable index into [`SensorError::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Timeout => 0,
            Self::ChecksumError => 1,
            Self::DeviceUnresponsive => 2,
            Self::DeviceNotFound => 3,
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timeout"),
            Self::ChecksumError => write!(f, "checksum error"),
            Self::DeviceUnresponsive => write!(f, "device unresponsive"),
            Self::DeviceNotFound => write!(f, "device not found"),
        }
    }
}

impl core::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

/// Errors from the consumer side of a reading queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Nothing arrived before the receive deadline.
    Timeout,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "receive timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
