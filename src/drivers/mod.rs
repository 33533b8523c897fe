//! Line drivers and task helpers.

#[cfg(not(target_os = "espidf"))]
pub mod sim_wire;
#[cfg(target_os = "espidf")]
pub mod single_wire;
pub mod task_pin;
