//! Mock hardware adapters for integration tests.
//!
//! Record every bus transaction and every published reading so tests can
//! assert on full histories without touching real GPIO or I2C registers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use climanode::app::ports::{PublishError, PublishPort, SensorPort};
use climanode::error::SensorError;
use climanode::sensors::{BatteryReading, HumidityReading, Reading};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

// ── MockI2c ───────────────────────────────────────────────────

/// One transaction as seen on the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusCall {
    pub address: u8,
    pub written: Vec<u8>,
    pub read_len: usize,
}

/// Register-file I2C device at one address.
///
/// `nack_next` makes the next N transactions fail; `absent` makes every
/// transaction fail.  Unknown registers read as zero.
pub struct MockI2c {
    pub address: u8,
    pub registers: HashMap<u8, u16>,
    pub nack_next: usize,
    pub absent: bool,
    pub calls: Vec<BusCall>,
}

#[allow(dead_code)]
impl MockI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: HashMap::new(),
            nack_next: 0,
            absent: false,
            calls: Vec::new(),
        }
    }

    pub fn absent(address: u8) -> Self {
        Self {
            absent: true,
            ..Self::new(address)
        }
    }

    pub fn with_register(mut self, reg: u8, value: u16) -> Self {
        self.registers.insert(reg, value);
        self
    }

    pub fn nacking(mut self, count: usize) -> Self {
        self.nack_next = count;
        self
    }

    /// Register pointers written by successful or failed reads, in order.
    pub fn register_reads(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter(|c| c.read_len > 0)
            .filter_map(|c| c.written.first().copied())
            .collect()
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut call = BusCall {
            address,
            written: Vec::new(),
            read_len: 0,
        };
        for op in operations.iter() {
            match op {
                Operation::Write(bytes) => call.written.extend_from_slice(bytes),
                Operation::Read(buf) => call.read_len += buf.len(),
            }
        }
        let pointer = call.written.first().copied();
        self.calls.push(call);

        if self.absent || address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        if self.nack_next > 0 {
            self.nack_next -= 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }

        let value = pointer
            .and_then(|reg| self.registers.get(&reg).copied())
            .unwrap_or(0)
            .to_be_bytes();
        for op in operations.iter_mut() {
            if let Operation::Read(buf) = op {
                for (dst, src) in buf.iter_mut().zip(value.iter()) {
                    *dst = *src;
                }
            }
        }
        Ok(())
    }
}

// ── NoDelay ───────────────────────────────────────────────────

/// Delay that returns immediately and remembers what it was asked for.
#[derive(Default)]
pub struct NoDelay {
    pub total_us: u64,
    pub calls: u32,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_us += u64::from(ns.div_ceil(1000));
        self.calls += 1;
    }
}

// ── RecordingPublisher ────────────────────────────────────────

/// Publish sink whose history stays readable after the sink moves into
/// the publisher task.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub readings: Arc<Mutex<Vec<Reading>>>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.readings.lock().unwrap().len()
    }

    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.lock().unwrap().clone()
    }

    pub fn humidity_values(&self) -> Vec<f32> {
        self.snapshot()
            .into_iter()
            .filter_map(|r| match r {
                Reading::Humidity(h) => Some(h.humidity),
                Reading::Battery(_) => None,
            })
            .collect()
    }

    pub fn battery_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|r| matches!(r, Reading::Battery(_)))
            .count()
    }
}

impl PublishPort for RecordingPublisher {
    fn publish(&mut self, reading: &Reading) -> Result<(), PublishError> {
        self.readings.lock().unwrap().push(*reading);
        Ok(())
    }
}

// ── Sensor sources ────────────────────────────────────────────

/// Humidity source producing 0, 1, 2, ... so delivery order is visible.
#[derive(Default)]
pub struct CountingSensor {
    next: u32,
}

impl SensorPort for CountingSensor {
    type Reading = HumidityReading;

    fn name(&self) -> &'static str {
        "COUNTER"
    }

    fn sample(&mut self) -> Result<HumidityReading, SensorError> {
        let value = self.next as f32;
        self.next += 1;
        Ok(HumidityReading {
            temperature: 20.0,
            humidity: value,
        })
    }
}

/// Source that fails every `fail_every`-th read with `kind`.
pub struct FlakySensor {
    pub fail_every: u32,
    pub kind: SensorError,
    count: u32,
}

impl FlakySensor {
    pub fn new(fail_every: u32, kind: SensorError) -> Self {
        Self {
            fail_every,
            kind,
            count: 0,
        }
    }
}

impl SensorPort for FlakySensor {
    type Reading = BatteryReading;

    fn name(&self) -> &'static str {
        "FLAKY"
    }

    fn sample(&mut self) -> Result<BatteryReading, SensorError> {
        self.count += 1;
        if self.count % self.fail_every == 0 {
            return Err(self.kind);
        }
        Ok(BatteryReading {
            voltage: 3.7,
            state_of_charge: 50.0,
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Poll `cond` until it holds, failing the test after five seconds.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(2));
    }
}
