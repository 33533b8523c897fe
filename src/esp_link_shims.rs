//! ESP-IDF link-time providers.
//!
//! `embassy-sync` guards its channels and signals with
//! `CriticalSectionRawMutex`.  The pipeline tasks are ordinary pthreads, so
//! a process-wide mutex is enough; interrupts never touch the queues.
//! Nested acquires on the same thread only bump a depth counter.
//!
//! The queue receive timeout runs on embassy-time, whose driver is
//! registered here from `esp_timer`.

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(target_os = "espidf")]
static CRITICAL_SECTION_MUTEX: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static CRITICAL_SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CRITICAL_SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            // The mutex guards `()`, so poisoning carries no state.
            let lock = CRITICAL_SECTION_MUTEX
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            CRITICAL_SECTION_GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
        }
        let new_depth = d.saturating_add(1);
        depth.set(new_depth);
        new_depth
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            CRITICAL_SECTION_GUARD.with(|guard| *guard.borrow_mut() = None);
        }
    });
}

// ───────────────────────────────────────────────────────────────
// embassy-time driver
// ───────────────────────────────────────────────────────────────

/// Time source for `async_io_mini::Timer`, which backs the queue receive
/// timeout.  Ticks are `esp_timer` microseconds, matching embassy-time's
/// default 1 MHz tick rate.  Host builds get embassy-time's `std` driver.
#[cfg(target_os = "espidf")]
struct EspTimerDriver;

#[cfg(target_os = "espidf")]
impl embassy_time_driver::Driver for EspTimerDriver {
    fn now(&self) -> u64 {
        // SAFETY: esp_timer is started by the IDF before `app_main`.
        unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
    }

    // Receive timeouts are rare, so one short-lived thread per wake is
    // acceptable and keeps the driver free of a timer queue.
    fn schedule_wake(&self, at: u64, waker: &core::task::Waker) {
        let waker = waker.clone();
        let now = self.now();
        std::thread::spawn(move || {
            if at > now {
                std::thread::sleep(std::time::Duration::from_micros(at - now));
            }
            waker.wake();
        });
    }
}

#[cfg(target_os = "espidf")]
embassy_time_driver::time_driver_impl!(static ESP_TIMER_DRIVER: EspTimerDriver = EspTimerDriver);
