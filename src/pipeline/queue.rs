//! Bounded reading queues.
//!
//! One queue per reading type, backed by an `embassy-sync` channel.  The
//! queue is split at construction into exactly one [`Producer`] and one
//! [`Consumer`]; neither half is `Clone`, so the single-producer /
//! single-consumer shape is enforced by ownership.
//!
//! ```text
//!  Sampler ──try_send──▶ [ r0 r1 r2 … r9 ] ──receive──▶ Publisher
//!            (drop when full)      FIFO        (blocks when empty)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;

use crate::error::QueueError;

/// Slots per reading queue.
pub const QUEUE_DEPTH: usize = 10;

struct Shared<T, const N: usize> {
    name: &'static str,
    channel: Channel<CriticalSectionRawMutex, T, N>,
    dropped: AtomicU32,
}

/// Create a queue of `N` slots and split it into its two halves.
pub fn reading_queue<T, const N: usize>(name: &'static str) -> (Producer<T, N>, Consumer<T, N>) {
    let shared = Arc::new(Shared {
        name,
        channel: Channel::new(),
        dropped: AtomicU32::new(0),
    });
    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

// ───────────────────────────────────────────────────────────────
// Producer half
// ───────────────────────────────────────────────────────────────

/// Sending half.  Never blocks.
pub struct Producer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> Producer<T, N> {
    /// Enqueue `item` if a slot is free.  On a full queue the item is
    /// handed back, the drop counter advances and queued items are left
    /// untouched.
    pub fn try_send(&self, item: T) -> Result<(), T> {
        self.shared.channel.try_send(item).map_err(|e| {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            match e {
                embassy_sync::channel::TrySendError::Full(item) => item,
            }
        })
    }

    /// Items dropped on a full queue since creation.
    pub fn dropped(&self) -> u32 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.shared.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.channel.is_empty()
    }

    pub fn name(&self) -> &'static str {
        self.shared.name
    }
}

// ───────────────────────────────────────────────────────────────
// Consumer half
// ───────────────────────────────────────────────────────────────

/// Receiving half.
pub struct Consumer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> Consumer<T, N> {
    /// Wait for the oldest item.
    pub async fn receive(&self) -> T {
        self.shared.channel.receive().await
    }

    /// Block the calling thread until an item is available.
    pub fn receive_blocking(&self) -> T {
        future::block_on(self.receive())
    }

    /// Block for at most `timeout`.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        future::block_on(future::or(async { Ok(self.receive().await) }, async {
            async_io_mini::Timer::after(timeout).await;
            Err(QueueError::Timeout)
        }))
    }

    pub fn try_receive(&self) -> Option<T> {
        self.shared.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.shared.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.channel.is_empty()
    }

    /// Items the producer dropped on a full queue.
    pub fn dropped(&self) -> u32 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.shared.name
    }
}
