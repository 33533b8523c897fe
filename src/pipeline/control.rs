//! Pipeline control: the publisher's pause gate, the sampler stop signal
//! and the link watcher that drives the gate from connectivity edges.
//!
//! Pausing only gates the consumer.  Samplers keep running and their
//! queues fill and then drop, so a long outage never stalls a producer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

use crate::app::ports::LinkPort;

// ───────────────────────────────────────────────────────────────
// Publisher gate
// ───────────────────────────────────────────────────────────────

/// Shared state between the link controls and the publisher task.
///
/// `changed` wakes the publisher whenever a flag flips.  There is exactly
/// one waiter (the publisher), which is what `Signal` supports.
pub struct PublishGate {
    paused: AtomicBool,
    stopped: AtomicBool,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for PublishGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishGate {
    pub const fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            changed: Signal::new(),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        self.changed.signal(());
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.changed.signal(());
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.changed.signal(());
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Resolves once the publisher must stop dequeuing (paused or stopped).
    pub async fn halted(&self) {
        while !(self.is_paused() || self.is_stopped()) {
            self.changed.wait().await;
        }
    }

    /// Resolves once the publisher may dequeue again (resumed or stopped).
    pub async fn released(&self) {
        while self.is_paused() && !self.is_stopped() {
            self.changed.wait().await;
        }
    }
}

/// External handle on the publisher gate.  Cheap to clone.
#[derive(Clone)]
pub struct LinkControl {
    gate: Arc<PublishGate>,
}

impl LinkControl {
    pub fn new(gate: Arc<PublishGate>) -> Self {
        Self { gate }
    }

    /// Stop delivering readings.  Idempotent.
    pub fn pause(&self) {
        self.gate.pause();
    }

    /// Deliver again, oldest reading first.  Idempotent.
    pub fn resume(&self) {
        self.gate.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }
}

// ───────────────────────────────────────────────────────────────
// Sampler stop signal
// ───────────────────────────────────────────────────────────────

/// Stop request observed by the sampler loops between cycles.
///
/// The period sleep is a condvar wait, so a stop cuts the sleep short
/// instead of waiting out a full sampling period.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `period` or until stopped.  Returns `true` if stopped.
    pub fn sleep(&self, period: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, period, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

// ───────────────────────────────────────────────────────────────
// Link watcher
// ───────────────────────────────────────────────────────────────

/// Polls a [`LinkPort`] and turns edges into pause / resume calls.
pub struct LinkWatcher<L> {
    link: L,
    control: LinkControl,
    last_up: Option<bool>,
}

impl<L: LinkPort> LinkWatcher<L> {
    pub fn new(link: L, control: LinkControl) -> Self {
        Self {
            link,
            control,
            last_up: None,
        }
    }

    /// Sample the link once.  The first poll always applies its state.
    pub fn poll(&mut self) -> bool {
        let up = self.link.is_up();
        if self.last_up != Some(up) {
            if up {
                match self.link.rssi() {
                    Some(rssi) => info!("LINK: up ({} dBm), resuming publisher", rssi),
                    None => info!("LINK: up, resuming publisher"),
                }
                self.control.resume();
            } else {
                warn!("LINK: down, pausing publisher");
                self.control.pause();
            }
            self.last_up = Some(up);
        }
        up
    }
}
