//! Application boundary: port traits only, zero I/O.
//!
//! All interaction with hardware and transports happens through the
//! **port traits** defined in [`ports`], keeping the pipeline fully
//! testable without real peripherals.

pub mod ports;
