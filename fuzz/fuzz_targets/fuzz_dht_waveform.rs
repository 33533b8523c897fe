//! Fuzz target: `Dht22::read` over a simulated line
//!
//! Turns arbitrary bytes into a line waveform (alternating low/high
//! segments, one byte per segment duration) and drives a full read.
//! The decoder must never panic and must finish within a bounded
//! virtual time.
//!
//! cargo fuzz run fuzz_dht_waveform

#![no_main]

use climanode::drivers::sim_wire::{Segment, SimWire};
use climanode::sensors::dht22::Dht22;
use libfuzzer_sys::fuzz_target;

/// Start signal plus presence plus 40 worst-case bits, with slack.
const MAX_READ_US: u64 = 3_025 + 2 * 85 + 40 * (56 + 75) + 100;

fuzz_target!(|data: &[u8]| {
    let script: Vec<Segment> = data
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let us = u32::from(d);
            if i % 2 == 0 { Segment::low(us) } else { Segment::high(us) }
        })
        .collect();

    let mut dht = Dht22::new(SimWire::new(script), 4);
    let result = dht.read();

    assert!(
        dht.line().now_us() <= MAX_READ_US,
        "read overran its time bound: {} µs",
        dht.line().now_us()
    );
    if let Ok(reading) = result {
        assert!(reading.humidity >= 0.0);
        assert!(reading.humidity <= 6553.5);
    }
});
