//! Core-pinned task spawning for the pipeline threads.
//!
//! On ESP-IDF `std::thread` is a pthread on top of a FreeRTOS task, and
//! `esp_pthread_set_cfg()` sets the affinity, priority and stack used by
//! the *next* `pthread_create()` from the calling thread.  Configuration and
//! spawn therefore happen back to back.  On other targets the priority and
//! core are ignored.
//!
//! Spawn failures are returned rather than panicking: a task that cannot be
//! allocated aborts startup of its subsystem.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers for the ESP32 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU), shared with WiFi and lwIP.
    Pro = 0,
    /// Core 1 (APP_CPU), busy-polling samplers.
    App = 1,
}

/// Parameters for one pipeline task.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Thread name; a trailing NUL is added on ESP-IDF.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// Spawn `f` as a task described by `spec`.
#[cfg(target_os = "espidf")]
pub fn spawn_task<T>(spec: TaskSpec, f: impl FnOnce() -> T + Send + 'static) -> io::Result<JoinHandle<T>>
where
    T: Send + 'static,
{
    // esp_pthread_cfg_t keeps the pointer, so the NUL-terminated copy must
    // outlive the spawn; task names are few and created once at boot.
    let c_name: &'static str = Box::leak(format!("{}\0", spec.name).into_boxed_str());

    // SAFETY: the config struct is fully initialised by
    // esp_create_default_pthread_config() and c_name is 'static.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = i32::from(spec.priority);
        cfg.stack_size = (spec.stack_kb * 1024) as _;
        cfg.thread_name = c_name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        spec.name,
        spec.core,
        spec.priority,
        spec.stack_kb
    );

    std::thread::Builder::new().name(spec.name.into()).spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_task<T>(spec: TaskSpec, f: impl FnOnce() -> T + Send + 'static) -> io::Result<JoinHandle<T>>
where
    T: Send + 'static,
{
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        spec.name,
        spec.stack_kb
    );

    // Host formatting and test harness frames need more than a FreeRTOS task.
    std::thread::Builder::new()
        .name(spec.name.into())
        .stack_size(spec.stack_kb.max(64) * 1024)
        .spawn(f)
}
