//! Publisher task: the single consumer of both reading queues.
//!
//! Readings are delivered to the [`PublishPort`] one at a time, each queue
//! in FIFO order.  While the gate is paused nothing is dequeued, so the
//! backlog is delivered oldest-first on resume.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use futures_lite::future;
use log::{info, warn};

use super::control::PublishGate;
use super::queue::{Consumer, QUEUE_DEPTH};
use crate::app::ports::PublishPort;
use crate::sensors::{BatteryReading, HumidityReading, Reading};

enum Next {
    Deliver(Reading),
    Halt,
}

pub struct Publisher<P> {
    sink: P,
    humidity: Consumer<HumidityReading, QUEUE_DEPTH>,
    battery: Consumer<BatteryReading, QUEUE_DEPTH>,
    gate: Arc<PublishGate>,
    delivered: Arc<AtomicU32>,
}

impl<P: PublishPort> Publisher<P> {
    pub fn new(
        sink: P,
        humidity: Consumer<HumidityReading, QUEUE_DEPTH>,
        battery: Consumer<BatteryReading, QUEUE_DEPTH>,
        gate: Arc<PublishGate>,
    ) -> Self {
        Self {
            sink,
            humidity,
            battery,
            gate,
            delivered: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Count of readings handed to the sink, including rejected ones.
    pub fn delivered(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.delivered)
    }

    /// Wait for the next reading or for the gate to close, whichever
    /// comes first.  The gate is polled first so a pause always wins.
    async fn next(&self) -> Next {
        future::or(
            async {
                self.gate.halted().await;
                Next::Halt
            },
            future::or(
                async { Next::Deliver(self.humidity.receive().await.into()) },
                async { Next::Deliver(self.battery.receive().await.into()) },
            ),
        )
        .await
    }

    fn deliver(&mut self, reading: &Reading) {
        info!("PUBLISH: {}", reading.format_line());
        if let Err(e) = self.sink.publish(reading) {
            warn!("PUBLISH: sink refused reading: {}", e);
        }
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Consume until the gate is stopped.  Returns the sink.
    pub fn run(mut self) -> P {
        info!("PUBLISH: task started");
        while !self.gate.is_stopped() {
            if self.gate.is_paused() {
                info!(
                    "PUBLISH: paused ({} humidity, {} battery waiting)",
                    self.humidity.len(),
                    self.battery.len()
                );
                future::block_on(self.gate.released());
                if !self.gate.is_stopped() {
                    info!("PUBLISH: resumed");
                }
                continue;
            }
            match future::block_on(self.next()) {
                Next::Deliver(reading) => self.deliver(&reading),
                Next::Halt => {}
            }
        }
        info!("PUBLISH: task stopped");
        self.sink
    }
}
