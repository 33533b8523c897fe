//! Simulated single-wire line for host builds.
//!
//! Replays a scripted waveform against a virtual microsecond clock.  The
//! clock only advances through [`DelayNs`], so a busy-poll loop observes
//! exactly the durations in the script regardless of host scheduling.
//!
//! ```text
//!  host drives      release          scripted segments            idle
//!  ───┐    ┌──────┐ │ ┌───┐   ┌────┐ ┌──┐ ┌───────┐ ...  ┌───────────────
//!     └────┘      │ ▼ │   └───┘    └─┘  └─┘       └─...──┘  (pull-up)
//! ```
//!
//! Every switch to [`PinMode::Input`] starts the next queued script at the
//! current virtual time.  Once the queue is exhausted the last script is
//! replayed, so one wire can serve any number of reads.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::app::ports::{GpioPort, PinMode};

/// Presence pulse length, each phase (µs).
pub const PRESENCE_US: u32 = 80;
/// Start-of-bit low phase (µs).
pub const BIT_LOW_US: u32 = 50;
/// High phase of a `0` bit (µs).
pub const ZERO_HIGH_US: u32 = 26;
/// High phase of a `1` bit (µs).
pub const ONE_HIGH_US: u32 = 70;

/// One constant-level stretch of the sensor's waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub level: PinState,
    pub duration_us: u32,
}

impl Segment {
    pub const fn low(duration_us: u32) -> Self {
        Self {
            level: PinState::Low,
            duration_us,
        }
    }

    pub const fn high(duration_us: u32) -> Self {
        Self {
            level: PinState::High,
            duration_us,
        }
    }
}

/// Index of the low segment of data bit `bit` in a [`frame_script`].
pub const fn bit_low_index(bit: usize) -> usize {
    2 + 2 * bit
}

/// Index of the high segment of data bit `bit` in a [`frame_script`].
pub const fn bit_high_index(bit: usize) -> usize {
    3 + 2 * bit
}

/// Waveform of a well-behaved sensor sending `frame`.
///
/// Layout: presence low, presence high, then `(low, high)` per bit
/// MSB-first, then the end-of-frame low.
pub fn frame_script(frame: [u8; 5]) -> Vec<Segment> {
    frame_script_with(frame, |_, bit| if bit { ONE_HIGH_US } else { ZERO_HIGH_US })
}

/// Like [`frame_script`], with the high time of each bit chosen by
/// `high_us(bit_index, bit_value)`.
pub fn frame_script_with(frame: [u8; 5], mut high_us: impl FnMut(usize, bool) -> u32) -> Vec<Segment> {
    let mut script = Vec::with_capacity(2 + 80 + 1);
    script.push(Segment::low(PRESENCE_US));
    script.push(Segment::high(PRESENCE_US));
    for index in 0..40 {
        let bit = frame[index / 8] & (0x80 >> (index % 8)) != 0;
        script.push(Segment::low(BIT_LOW_US));
        script.push(Segment::high(high_us(index, bit)));
    }
    script.push(Segment::low(BIT_LOW_US));
    script
}

/// A simulated open-drain line with a sensor attached.
pub struct SimWire {
    now_ns: u64,
    mode: PinMode,
    driven: PinState,
    released_at_us: u64,
    current: Vec<Segment>,
    pending: VecDeque<Vec<Segment>>,
    drive_log: Vec<(u64, PinState)>,
    releases: u32,
}

impl SimWire {
    /// Wire whose sensor answers every request with `script`.
    pub fn new(script: Vec<Segment>) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(script);
        Self {
            now_ns: 0,
            mode: PinMode::Input,
            driven: PinState::High,
            released_at_us: 0,
            current: Vec::new(),
            pending,
            drive_log: Vec::new(),
            releases: 0,
        }
    }

    /// Wire whose sensor sends `frame` with nominal timing.
    pub fn responding_with(frame: [u8; 5]) -> Self {
        Self::new(frame_script(frame))
    }

    /// Wire with nothing attached: the pull-up holds it high.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Queue `script` for the next request after those already queued.
    pub fn then(mut self, script: Vec<Segment>) -> Self {
        self.pending.push_back(script);
        self
    }

    /// Virtual time since construction (µs).
    pub fn now_us(&self) -> u64 {
        self.now_ns / 1000
    }

    /// Host-driven level changes as `(time_us, level)`.
    pub fn drive_log(&self) -> &[(u64, PinState)] {
        &self.drive_log
    }

    /// Virtual time of the most recent release to input mode (µs).
    pub fn released_at_us(&self) -> u64 {
        self.released_at_us
    }

    /// How many times the host has released the line.
    pub fn releases(&self) -> u32 {
        self.releases
    }

    fn scripted_level(&self) -> PinState {
        let mut t = self.now_us().saturating_sub(self.released_at_us);
        for seg in &self.current {
            if t < u64::from(seg.duration_us) {
                return seg.level;
            }
            t -= u64::from(seg.duration_us);
        }
        PinState::High
    }
}

impl GpioPort for SimWire {
    fn set_direction(&mut self, _pin: i32, mode: PinMode) {
        if mode == PinMode::Input && self.mode == PinMode::Output {
            self.released_at_us = self.now_us();
            self.releases += 1;
            if let Some(next) = self.pending.pop_front() {
                self.current = next;
            }
        }
        self.mode = mode;
    }

    fn set_level(&mut self, _pin: i32, level: PinState) {
        self.driven = level;
        if self.mode == PinMode::Output {
            self.drive_log.push((self.now_us(), level));
        }
    }

    fn get_level(&mut self, _pin: i32) -> PinState {
        match self.mode {
            PinMode::Output => self.driven,
            PinMode::Input => self.scripted_level(),
        }
    }
}

impl DelayNs for SimWire {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns += u64::from(ns);
    }
}
