//! Registry lifecycle against a simulated multi-chip bus

mod common;

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use common::SimulatedBus;
use max6675_hub::config::{parse_bus_config, parse_sensor_config};
use max6675_hub::{
    sample_once, AbsentReason, Max6675Builder, Max6675Registry, ReadPolicy, Reading,
    RegistryError, SensorError, SpiBusHandle, MAX6675_SPI_SETTINGS,
};

fn shared_bus() -> (SimulatedBus, SpiBusHandle) {
    let sim = SimulatedBus::new("spi0")
        .with_chip(5, 0x0680)
        .with_chip(6, 0x0004)
        .with_chip(13, 0x7FF8);
    let handle = SpiBusHandle::new(sim.clone());
    (sim, handle)
}

#[test]
fn three_chips_on_one_bus() {
    let (sim, bus) = shared_bus();
    let registry = Max6675Registry::new();
    for cs in [5u32, 6, 13] {
        registry
            .add_sensor(Max6675Builder::new(bus.clone()).with_chip_select(cs).config())
            .unwrap();
    }
    let report = registry.setup().unwrap();
    assert!(report.is_complete());

    let readings: Vec<Reading> = registry
        .read_all()
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        readings,
        vec![
            Reading::Value(52.0),
            Reading::Absent(AbsentReason::OpenCircuit),
            Reading::Value(1023.75),
        ]
    );

    let state = sim.state.lock();
    assert_eq!(state.transactions, 3);
    assert!(state.idle_high_after);
    assert!(state.settings.iter().all(|s| *s == MAX6675_SPI_SETTINGS));
}

#[test]
fn bad_binding_does_not_disable_the_fleet() {
    let (sim, bus) = shared_bus();
    let sim = sim.with_invalid_pin(40);
    let registry = Max6675Registry::new();
    for cs in [5u32, 40, 13] {
        registry
            .add_sensor(Max6675Builder::new(bus.clone()).with_chip_select(cs).config())
            .unwrap();
    }

    let report = registry.setup().unwrap();
    assert_eq!(report.initialized, vec![0, 2]);
    assert_eq!(report.failed_indices(), vec![1]);

    let first = registry.with_sensor(0, |s| s.read_value().unwrap()).unwrap();
    let third = registry.with_sensor(2, |s| s.read_value().unwrap()).unwrap();
    assert_eq!(first, Reading::Value(52.0));
    assert_eq!(third, Reading::Value(1023.75));

    let second = registry.with_sensor(1, |s| s.read_value()).unwrap();
    assert!(matches!(second, Err(SensorError::NotInitialized { .. })));
    assert_eq!(sim.transactions(), 2);
}

#[test]
fn sensor_added_after_setup_is_flagged_and_unreadable() {
    let (sim, bus) = shared_bus();
    let registry = Max6675Registry::new();
    registry
        .add_sensor(Max6675Builder::new(bus.clone()).with_chip_select(5u32).config())
        .unwrap();
    registry.setup().unwrap();

    let late = registry.add_sensor(Max6675Builder::new(bus).with_chip_select(13u32).config());
    assert!(matches!(late, Err(RegistryError::LateRegistration { index: 1 })));

    let read = registry.with_sensor(1, |s| s.read_value()).unwrap();
    assert!(matches!(read, Err(SensorError::NotInitialized { .. })));
    assert_eq!(sim.transactions(), 0);
}

#[test]
fn legacy_sensor_reads_zero_when_never_bound() {
    let (sim, bus) = shared_bus();
    let sensor = Max6675Builder::new(bus)
        .with_chip_select(5u32)
        .with_read_policy(ReadPolicy::Legacy)
        .build();
    assert_eq!(sensor.read_value().unwrap(), Reading::Value(0.0));
    assert_eq!(sensor.read_value_fahrenheit().unwrap(), Reading::Value(32.0));
    assert_eq!(sim.transactions(), 0);
}

#[test]
fn empty_select_reads_as_zero_degrees() {
    let (_sim, bus) = shared_bus();
    let mut sensor = Max6675Builder::new(bus).with_chip_select(21u32).build();
    sensor.initialize().unwrap();
    // Indistinguishable from a real 0 °C reading.
    assert_eq!(sensor.read_raw().unwrap(), 0);
    assert_eq!(sensor.read_value().unwrap(), Reading::Value(0.0));
}

#[test]
fn open_detection_disabled_decodes_through_bit_two() {
    let (_sim, bus) = shared_bus();
    let mut sensor = Max6675Builder::new(bus)
        .with_chip_select(6u32)
        .with_open_detection(false)
        .build();
    sensor.initialize().unwrap();
    assert_eq!(sensor.read_value().unwrap(), Reading::Value(0.0));
}

#[test]
fn readings_follow_the_chip() {
    let (sim, bus) = shared_bus();
    let mut sensor = Max6675Builder::new(bus).with_chip_select(5u32).build();
    sensor.initialize().unwrap();

    sim.set_word(5, 0x0C80); // 400 counts
    assert_eq!(sensor.read_value().unwrap(), Reading::Value(100.0));
    assert_eq!(sensor.read_value_fahrenheit().unwrap(), Reading::Value(212.0));

    sim.set_word(5, 0x0C84);
    assert!(sensor.read_value_fahrenheit().unwrap().is_absent());
}

#[test]
fn registry_lock_serializes_sequences_across_threads() {
    let registry: &'static Max6675Registry = Box::leak(Box::new(Max6675Registry::new()));

    let outer = registry.lock();
    let nested = registry.lock();

    let (tx, rx) = mpsc::channel();
    let waiter = thread::spawn(move || {
        let started = Instant::now();
        let _guard = registry.lock();
        tx.send(started.elapsed()).unwrap();
    });

    thread::sleep(Duration::from_millis(50));
    assert!(rx.try_recv().is_err());
    drop(nested);
    thread::sleep(Duration::from_millis(20));
    // One level still held.
    assert!(rx.try_recv().is_err());
    drop(outer);

    let waited = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(waited >= Duration::from_millis(50));
    waiter.join().unwrap();
}

#[test]
fn registers_from_toml() {
    let (_sim, bus) = shared_bus();
    let buses_cfg = parse_bus_config(
        r#"
        [[bus]]
        id = "spi0"
        type = "spidev"
        path = "/dev/spidev0.0"
        "#,
    )
    .unwrap();
    let sensors_cfg = parse_sensor_config(
        r#"
        sample_interval_ms = 1000

        [[sensor]]
        id = "boiler"
        bus = "spi0"
        chip_select = 5

        [[sensor]]
        id = "flue"
        bus = "spi0"
        chip_select = 6
        open_detection = false
        "#,
    )
    .unwrap();
    sensors_cfg.validate(&buses_cfg).unwrap();

    let mut buses = HashMap::new();
    buses.insert("spi0".to_string(), bus);

    let registry = Max6675Registry::new();
    assert_eq!(registry.register_all(&sensors_cfg, &buses).unwrap(), vec![0, 1]);
    registry.setup().unwrap();

    let samples = sample_once(&registry);
    assert_eq!(samples[0].label, "boiler");
    assert_eq!(samples[0].describe(), "0: 52.00 C, 125.60 F");
    assert_eq!(samples[1].label, "flue");
    assert_eq!(samples[1].describe(), "1: 0.00 C, 32.00 F");
}

#[test]
fn unknown_bus_in_config_is_rejected_at_registration() {
    let sensors_cfg = parse_sensor_config(
        r#"
        [[sensor]]
        id = "boiler"
        bus = "spi9"
        "#,
    )
    .unwrap();
    let registry = Max6675Registry::new();
    let err = registry.register_all(&sensors_cfg, &HashMap::new()).unwrap_err();
    assert!(matches!(err, RegistryError::BusInitError(_)));
    assert_eq!(registry.sensor_count(), 0);
}
