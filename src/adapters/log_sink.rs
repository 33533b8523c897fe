//! Log-based publish adapter.
//!
//! Implements [`PublishPort`] by writing each reading as a JSON payload to
//! the ESP-IDF logger (UART / USB-CDC in production).  A broker-backed
//! transport would implement the same trait and reuse the topic names.

use log::info;

use crate::app::ports::{PublishError, PublishPort};
use crate::sensors::Reading;

/// Topic for humidity/temperature readings.
pub const TOPIC_HUMIDITY: &str = "climanode/humidity";
/// Topic for fuel-gauge readings.
pub const TOPIC_BATTERY: &str = "climanode/battery";

pub fn topic_for(reading: &Reading) -> &'static str {
    match reading {
        Reading::Humidity(_) => TOPIC_HUMIDITY,
        Reading::Battery(_) => TOPIC_BATTERY,
    }
}

/// Adapter that logs every reading to the serial console.
#[derive(Default)]
pub struct LogPublisher {
    published: u32,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u32 {
        self.published
    }
}

impl PublishPort for LogPublisher {
    fn publish(&mut self, reading: &Reading) -> Result<(), PublishError> {
        let payload = serde_json::to_string(reading).map_err(|_| PublishError::Rejected)?;
        info!("TELEM | {} | {}", topic_for(reading), payload);
        self.published = self.published.wrapping_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{BatteryReading, HumidityReading};

    #[test]
    fn topics_follow_reading_kind() {
        let h = Reading::from(HumidityReading {
            temperature: 1.0,
            humidity: 2.0,
        });
        let b = Reading::from(BatteryReading {
            voltage: 3.9,
            state_of_charge: 80.0,
        });
        assert_eq!(topic_for(&h), TOPIC_HUMIDITY);
        assert_eq!(topic_for(&b), TOPIC_BATTERY);
    }

    #[test]
    fn publish_counts_readings() {
        let mut sink = LogPublisher::new();
        let r = Reading::from(BatteryReading {
            voltage: 3.9,
            state_of_charge: 80.0,
        });
        sink.publish(&r).unwrap();
        sink.publish(&r).unwrap();
        assert_eq!(sink.published(), 2);
    }
}
