//! Climanode firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspSingleWire      I2cDriver + Ets    LogPublisher StationLink│
//! │  (GpioPort)         (embedded-hal I2c) (PublishPort)(LinkPort) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Dht22 · FuelGauge → Samplers → Queues → Publisher     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Main loop: link watcher (pause / resume) · periodic stats     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use climanode::adapters::link::StationLink;
use climanode::adapters::log_sink::LogPublisher;
use climanode::config::SystemConfig;
use climanode::drivers::single_wire::EspSingleWire;
use climanode::pins;
use climanode::pipeline::control::LinkWatcher;
use climanode::pipeline::{Pipeline, PipelineContext};
use climanode::sensors::battery::FuelGauge;
use climanode::sensors::dht22::Dht22;

/// Main-loop iterations between statistics lines.
const STATS_EVERY_POLLS: u32 = 60;

// The I2C pins are taken below as typed `gpio21` / `gpio22`.
const _: () = assert!(pins::I2C_SDA_GPIO == 21 && pins::I2C_SCL_GPIO == 22);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Climanode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;
    info!(
        "Config: DHT22 on GPIO{} every {} ms, gauge 0x{:02X} @ {} Hz every {} ms",
        config.dht_gpio,
        config.dht_period_ms,
        config.gauge_address,
        config.i2c_freq_hz,
        config.battery_period_ms
    );

    // ── 2. Humidity sensor ────────────────────────────────────
    let dht = Dht22::new(EspSingleWire::new(config.dht_gpio), config.dht_gpio);

    // ── 3. Fuel gauge (optional) ──────────────────────────────
    let peripherals = Peripherals::take()?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(config.i2c_freq_hz)),
    )?;
    info!(
        "I2C{}: SDA=GPIO{} SCL=GPIO{}",
        pins::I2C_PORT,
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO
    );

    let mut gauge = FuelGauge::from_config(i2c, Ets, &config);
    let battery = match gauge.bring_up() {
        Ok(_) => Some(gauge),
        Err(e) => {
            warn!("BATTERY: bring-up failed ({}), continuing without battery readings", e);
            None
        }
    };

    // ── 4. Pipeline ───────────────────────────────────────────
    let poll_interval = Duration::from_millis(u64::from(config.link_poll_interval_ms));
    let pipeline = Pipeline::start(PipelineContext {
        config,
        humidity: dht,
        battery,
        sink: LogPublisher::new(),
    })?;

    // ── 5. Link watch loop ────────────────────────────────────
    let mut watcher = LinkWatcher::new(StationLink::new(), pipeline.link());
    info!("System ready. Entering link watch loop.");

    let mut polls: u32 = 0;
    loop {
        watcher.poll();

        polls = polls.wrapping_add(1);
        if polls % STATS_EVERY_POLLS == 0 {
            let h = pipeline.humidity_stats();
            info!(
                "Stats: DHT22 cycles={} queued={} dropped={} failed={} | published={}",
                h.cycles,
                h.queued,
                h.dropped,
                h.total_failures(),
                pipeline.delivered()
            );
            if let Some(b) = pipeline.battery_stats() {
                info!(
                    "Stats: BATTERY cycles={} queued={} dropped={} failed={}",
                    b.cycles,
                    b.queued,
                    b.dropped,
                    b.total_failures()
                );
            }
        }

        std::thread::sleep(poll_interval);
    }
}
