//! End-to-end pipeline tests: real samplers, queues and publisher task,
//! mock sensors and a recording sink.

use std::time::Duration;

use climanode::config::SystemConfig;
use climanode::drivers::sim_wire::SimWire;
use climanode::error::SensorError;
use climanode::pipeline::queue::QUEUE_DEPTH;
use climanode::pipeline::{Pipeline, PipelineContext};
use climanode::sensors::Reading;
use climanode::sensors::battery::{FuelGauge, MAX17048_ADDR, REG_SOC, REG_VCELL};
use climanode::sensors::dht22::Dht22;

use crate::mock_hw::{CountingSensor, FlakySensor, MockI2c, NoDelay, RecordingPublisher, wait_until};

fn fast_config() -> SystemConfig {
    SystemConfig {
        dht_period_ms: 2,
        battery_period_ms: 2,
        ..SystemConfig::default()
    }
}

type NoGauge = FuelGauge<MockI2c, NoDelay>;

#[test]
fn decoded_frames_reach_the_sink() {
    // 65.2 %RH, 35.1 °C
    let wire = SimWire::responding_with([0x02, 0x8C, 0x01, 0x5F, 0xEE]);
    let gauge = FuelGauge::new(
        MockI2c::new(MAX17048_ADDR)
            .with_register(REG_VCELL, 0xC800)
            .with_register(REG_SOC, 0x3200),
        NoDelay::default(),
        MAX17048_ADDR,
    );
    let sink = RecordingPublisher::new();

    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: Dht22::new(wire, 4),
        battery: Some(gauge),
        sink: sink.clone(),
    })
    .unwrap();

    wait_until("both reading kinds", || {
        sink.humidity_values().len() >= 2 && sink.battery_count() >= 2
    });
    handle.join().unwrap();

    for reading in sink.snapshot() {
        match reading {
            Reading::Humidity(h) => {
                assert!((h.humidity - 65.2).abs() < 1e-4);
                assert!((h.temperature - 35.1).abs() < 1e-4);
            }
            Reading::Battery(b) => {
                assert!((b.voltage - 4.0).abs() < 1e-4);
                assert_eq!(b.state_of_charge, 50.0);
            }
        }
    }
}

#[test]
fn corrupted_frames_never_reach_the_sink() {
    let wire = SimWire::responding_with([0x02, 0x8C, 0x01, 0x5F, 0xEF]);
    let sink = RecordingPublisher::new();

    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: Dht22::new(wire, 4),
        battery: None::<NoGauge>,
        sink: sink.clone(),
    })
    .unwrap();

    wait_until("a few failed cycles", || handle.humidity_stats().cycles >= 3);
    let stats = handle.humidity_stats();
    handle.join().unwrap();

    assert_eq!(sink.len(), 0);
    assert_eq!(stats.queued, 0);
    assert!(stats.failures_of(SensorError::ChecksumError) >= 3);
}

#[test]
fn silent_sensor_times_out_and_keeps_cycling() {
    let sink = RecordingPublisher::new();
    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: Dht22::new(SimWire::silent(), 4),
        battery: None::<NoGauge>,
        sink: sink.clone(),
    })
    .unwrap();

    wait_until("repeated timeouts", || {
        handle.humidity_stats().failures_of(SensorError::Timeout) >= 3
    });
    handle.join().unwrap();
    assert_eq!(sink.len(), 0);
}

#[test]
fn missing_gauge_skips_battery_sampler() {
    let sink = RecordingPublisher::new();
    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: CountingSensor::default(),
        battery: None::<NoGauge>,
        sink: sink.clone(),
    })
    .unwrap();

    assert!(!handle.has_battery());
    wait_until("humidity readings", || sink.len() >= 3);
    handle.join().unwrap();
    assert_eq!(sink.battery_count(), 0);
}

#[test]
fn flaky_battery_failures_are_counted_not_published() {
    let sink = RecordingPublisher::new();
    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: CountingSensor::default(),
        battery: Some(FlakySensor::new(2, SensorError::DeviceUnresponsive)),
        sink: sink.clone(),
    })
    .unwrap();

    wait_until("battery cycles", || {
        handle.battery_stats().is_some_and(|s| s.cycles >= 6) && sink.battery_count() >= 1
    });
    let stats = handle.battery_stats().unwrap();
    handle.join().unwrap();

    assert!(stats.failures_of(SensorError::DeviceUnresponsive) >= 3);
    assert!(stats.queued >= 3);
    assert_eq!(stats.total_failures(), stats.failures_of(SensorError::DeviceUnresponsive));
}

#[test]
fn pause_fills_queue_drops_newest_then_resume_drains_oldest_first() {
    let sink = RecordingPublisher::new();
    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: CountingSensor::default(),
        battery: None::<NoGauge>,
        sink: sink.clone(),
    })
    .unwrap();
    let link = handle.link();

    link.pause();
    wait_until("queue overflow while paused", || handle.humidity_stats().dropped >= 3);
    std::thread::sleep(Duration::from_millis(20));
    let delivered_while_paused = sink.len();

    // Producers keep sampling while the consumer is paused.
    let cycles = handle.humidity_stats().cycles;
    wait_until("sampler still cycling", || handle.humidity_stats().cycles > cycles + 3);
    assert_eq!(sink.len(), delivered_while_paused, "paused consumer must not deliver");

    link.resume();
    wait_until("backlog drained", || sink.len() >= delivered_while_paused + QUEUE_DEPTH);
    handle.join().unwrap();

    let values = sink.humidity_values();
    assert!(values.windows(2).all(|w| w[0] < w[1]), "FIFO order per queue");

    let backlog = &values[delivered_while_paused..delivered_while_paused + QUEUE_DEPTH];
    assert!(
        backlog.windows(2).all(|w| w[1] - w[0] == 1.0),
        "the oldest readings survive an overflow: {backlog:?}"
    );
}

#[test]
fn pause_and_resume_are_idempotent_on_a_live_pipeline() {
    let sink = RecordingPublisher::new();
    let handle = Pipeline::start(PipelineContext {
        config: fast_config(),
        humidity: CountingSensor::default(),
        battery: None::<NoGauge>,
        sink: sink.clone(),
    })
    .unwrap();
    let link = handle.link();

    link.resume();
    link.pause();
    link.pause();
    assert!(link.is_paused());
    link.resume();
    link.resume();
    assert!(!link.is_paused());

    wait_until("delivery after resume", || sink.len() >= 3);
    handle.join().unwrap();
}

#[test]
fn stop_while_paused_joins_and_returns_sink() {
    let sink = RecordingPublisher::new();
    let handle = Pipeline::start(PipelineContext {
        config: SystemConfig {
            dht_period_ms: 60_000,
            ..SystemConfig::default()
        },
        humidity: CountingSensor::default(),
        battery: None::<NoGauge>,
        sink: sink.clone(),
    })
    .unwrap();
    handle.link().pause();

    let returned = handle.join().unwrap();
    assert_eq!(returned.len(), sink.len());
}
