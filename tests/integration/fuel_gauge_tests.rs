//! Fuel gauge driver against a register-file I2C mock.

use climanode::config::SystemConfig;
use climanode::error::SensorError;
use climanode::sensors::battery::{FuelGauge, MAX17048_ADDR, REG_SOC, REG_VCELL, REG_VERSION};

use crate::mock_hw::{MockI2c, NoDelay};

fn healthy_bus() -> MockI2c {
    MockI2c::new(MAX17048_ADDR)
        .with_register(REG_VERSION, 0x0012)
        .with_register(REG_VCELL, 0xC800) // 51200 counts = 4.00 V
        .with_register(REG_SOC, 0x4B80) // 75.5 %
}

#[test]
fn bring_up_reads_version_then_one_reading() {
    let mut gauge = FuelGauge::new(healthy_bus(), NoDelay::default(), MAX17048_ADDR);
    let reading = gauge.bring_up().unwrap();

    assert!((reading.voltage - 4.0).abs() < 1e-4);
    assert_eq!(reading.state_of_charge, 75.5);
    assert_eq!(gauge.bus().register_reads(), vec![REG_VERSION, REG_VCELL, REG_SOC]);
    assert!(gauge.bus().calls.iter().all(|c| c.address == MAX17048_ADDR));
}

#[test]
fn transient_nacks_are_absorbed_by_retry() {
    let bus = healthy_bus().nacking(2);
    let mut gauge = FuelGauge::new(bus, NoDelay::default(), MAX17048_ADDR);

    assert_eq!(gauge.read_state_of_charge(), Ok(75.5));
    assert_eq!(gauge.bus().calls.len(), 3);
    assert_eq!(gauge.delay().total_us, 1000, "two 500 µs gaps, none after success");
}

#[test]
fn persistent_nack_reports_unresponsive() {
    let bus = healthy_bus().nacking(usize::MAX);
    let mut gauge = FuelGauge::new(bus, NoDelay::default(), MAX17048_ADDR);

    assert_eq!(gauge.read(), Err(SensorError::DeviceUnresponsive));
    assert_eq!(gauge.bus().calls.len(), 3, "voltage fails, SOC never attempted");
}

#[test]
fn absent_device_is_not_found() {
    let mut gauge = FuelGauge::new(MockI2c::absent(MAX17048_ADDR), NoDelay::default(), MAX17048_ADDR);
    assert_eq!(gauge.bring_up(), Err(SensorError::DeviceNotFound));
    assert_eq!(gauge.bus().register_reads(), Vec::<u8>::new());
}

#[test]
fn wrong_address_in_config_finds_nothing() {
    let config = SystemConfig {
        gauge_address: 0x37,
        ..SystemConfig::default()
    };
    let mut gauge = FuelGauge::from_config(healthy_bus(), NoDelay::default(), &config);
    assert_eq!(gauge.discover(), Err(SensorError::DeviceNotFound));
    assert_eq!(gauge.bus().calls.len(), usize::from(config.probe_attempts));
}

#[test]
fn config_retry_budget_is_honoured() {
    let config = SystemConfig {
        register_attempts: 5,
        register_retry_delay_us: 100,
        ..SystemConfig::default()
    };
    let bus = healthy_bus().nacking(4);
    let mut gauge = FuelGauge::from_config(bus, NoDelay::default(), &config);

    assert!(gauge.read_voltage().is_ok());
    assert_eq!(gauge.bus().calls.len(), 5);
    assert_eq!(gauge.delay().total_us, 400);
}
