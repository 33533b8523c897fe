//! ESP-IDF single-wire line: raw GPIO register access plus ROM busy delay.
//!
//! The DHT data line is open-drain with an external pull-up.  The driver
//! switches it to output for the start signal and back to input to listen.
//! `esp_rom_delay_us` spins on the CPU cycle counter, which is what the
//! 1 µs polling loop needs; a FreeRTOS delay would be a whole tick.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use esp_idf_svc::sys::*;

use crate::app::ports::{GpioPort, PinMode};

/// Handle on the ESP32 GPIO matrix for bit-banged protocols.
pub struct EspSingleWire {
    _private: (),
}

impl EspSingleWire {
    /// Reset `pin` to a floating input with the internal pull-up enabled.
    pub fn new(pin: i32) -> Self {
        // SAFETY: plain register configuration of a pin owned by this
        // driver; no other code touches the DHT line.
        unsafe {
            gpio_reset_pin(pin);
            gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
        }
        Self { _private: () }
    }
}

impl GpioPort for EspSingleWire {
    fn set_direction(&mut self, pin: i32, mode: PinMode) {
        let mode = match mode {
            PinMode::Input => gpio_mode_t_GPIO_MODE_INPUT,
            PinMode::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
        };
        // SAFETY: register write on the pin configured in new().
        unsafe {
            gpio_set_direction(pin, mode);
        }
    }

    fn set_level(&mut self, pin: i32, level: PinState) {
        let level = u32::from(level == PinState::High);
        // SAFETY: register write on the pin configured in new().
        unsafe {
            gpio_set_level(pin, level);
        }
    }

    fn get_level(&mut self, pin: i32) -> PinState {
        // SAFETY: read-only register access.
        if unsafe { gpio_get_level(pin) } != 0 {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

impl DelayNs for EspSingleWire {
    fn delay_ns(&mut self, ns: u32) {
        // SAFETY: ROM routine, spins without touching shared state.
        unsafe {
            esp_rom_delay_us(ns.div_ceil(1000));
        }
    }

    fn delay_us(&mut self, us: u32) {
        // SAFETY: as above.
        unsafe {
            esp_rom_delay_us(us);
        }
    }
}
