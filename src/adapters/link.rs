//! WiFi station link adapter.
//!
//! Implements [`LinkPort`] from the station's association state.  Bringing
//! the station up is someone else's job; this adapter only observes it.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_wifi_sta_get_ap_info` succeeds only
//!   while associated with an AP.
//! - **all other targets**: a process-wide simulated flag, up by default.

use crate::app::ports::LinkPort;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_os = "espidf"))]
static SIM_LINK_UP: AtomicBool = AtomicBool::new(true);

/// Simulation: force the link state seen by every [`StationLink`].
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_link_up(up: bool) {
    SIM_LINK_UP.store(up, Ordering::Relaxed);
}

/// Observes WiFi station association.
#[derive(Default)]
pub struct StationLink {
    last_rssi: Option<i8>,
}

impl StationLink {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(target_os = "espidf")]
    fn platform_ap_rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::{ESP_OK, esp_wifi_sta_get_ap_info, wifi_ap_record_t};

        let mut info = wifi_ap_record_t::default();
        // SAFETY: `info` is a valid out-pointer for the duration of the call.
        let ret = unsafe { esp_wifi_sta_get_ap_info(&mut info) };
        (ret == ESP_OK as i32).then_some(info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ap_rssi(&self) -> Option<i8> {
        SIM_LINK_UP.load(Ordering::Relaxed).then_some(-60)
    }
}

impl LinkPort for StationLink {
    fn is_up(&mut self) -> bool {
        self.last_rssi = self.platform_ap_rssi();
        self.last_rssi.is_some()
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_link_follows_flag() {
        let mut link = StationLink::new();
        assert!(link.is_up());
        assert!(link.rssi().is_some());
        sim_set_link_up(false);
        assert!(!link.is_up());
        assert_eq!(link.rssi(), None);
        sim_set_link_up(true);
        assert!(link.is_up());
    }
}
