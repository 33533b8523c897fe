//! Periodic sampler task: sample, classify, enqueue, sleep.
//!
//! A failed read is logged and counted and the cycle ends; nothing is
//! enqueued for it.  A full queue drops the new reading.  Neither outcome
//! changes the next cycle, which runs one full period later.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use log::{info, warn};

use super::control::StopSignal;
use super::queue::Producer;
use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::sensors::{Reading, log_failure};

/// What one sampling cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Reading validated and enqueued.
    Queued,
    /// Reading validated but the queue was full.
    Dropped,
    /// The read failed; nothing was produced.
    Failed(SensorError),
}

/// Per-sampler counters, readable from any thread.
#[derive(Debug, Default)]
pub struct SamplerStats {
    cycles: AtomicU32,
    queued: AtomicU32,
    dropped: AtomicU32,
    failures: [AtomicU32; SensorError::ALL.len()],
}

/// Point-in-time copy of [`SamplerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub cycles: u32,
    pub queued: u32,
    pub dropped: u32,
    /// Indexed by [`SensorError::index`].
    pub failures: [u32; SensorError::ALL.len()],
}

impl StatsSnapshot {
    pub fn failures_of(&self, kind: SensorError) -> u32 {
        self.failures[kind.index()]
    }

    pub fn total_failures(&self) -> u32 {
        self.failures.iter().sum()
    }
}

impl SamplerStats {
    // The outcome counter is bumped before `cycles`, so a snapshot never
    // shows a cycle whose outcome is missing.
    fn record(&self, outcome: CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::Queued => &self.queued,
            CycleOutcome::Dropped => &self.dropped,
            CycleOutcome::Failed(kind) => &self.failures[kind.index()],
        };
        counter.fetch_add(1, Ordering::Release);
        self.cycles.fetch_add(1, Ordering::Release);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Acquire),
            queued: self.queued.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
            failures: core::array::from_fn(|i| self.failures[i].load(Ordering::Acquire)),
        }
    }
}

/// Drives one [`SensorPort`] into one queue.
pub struct Sampler<S: SensorPort, const N: usize> {
    sensor: S,
    queue: Producer<S::Reading, N>,
    period: Duration,
    stats: Arc<SamplerStats>,
}

impl<S, const N: usize> Sampler<S, N>
where
    S: SensorPort,
    S::Reading: Into<Reading>,
{
    pub fn new(sensor: S, queue: Producer<S::Reading, N>, period: Duration) -> Self {
        Self {
            sensor,
            queue,
            period,
            stats: Arc::new(SamplerStats::default()),
        }
    }

    /// Shared counters; stays valid after the sampler is moved into its task.
    pub fn stats(&self) -> Arc<SamplerStats> {
        Arc::clone(&self.stats)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// One sample-and-enqueue step, without the sleep.
    pub fn cycle(&mut self) -> CycleOutcome {
        let name = self.sensor.name();
        let outcome = match self.sensor.sample() {
            Err(kind) => {
                log_failure(name, kind);
                CycleOutcome::Failed(kind)
            }
            Ok(reading) => {
                info!("{}: {}", name, Into::<Reading>::into(reading).format_line());
                match self.queue.try_send(reading) {
                    Ok(()) => CycleOutcome::Queued,
                    Err(_) => {
                        warn!(
                            "{}: {} queue full, reading dropped ({} so far)",
                            name,
                            self.queue.name(),
                            self.queue.dropped()
                        );
                        CycleOutcome::Dropped
                    }
                }
            }
        };
        self.stats.record(outcome);
        outcome
    }

    /// Cycle every period until `stop` is raised.  Returns the sensor.
    pub fn run(mut self, stop: &StopSignal) -> S {
        info!("{}: sampling every {} ms", self.sensor.name(), self.period.as_millis());
        while !stop.is_stopped() {
            self.cycle();
            if stop.sleep(self.period) {
                break;
            }
        }
        info!("{}: sampler stopped", self.sensor.name());
        self.sensor
    }
}
