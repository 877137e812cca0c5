use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::errors::SensorResult;
use crate::registry::Max6675Registry;
use crate::sensors::Reading;
use crate::units::convert_c_to_f;

/// One sensor's result from a sampling pass
#[derive(Debug)]
pub struct Sample {
    pub index: usize,
    pub label: String,
    pub reading: SensorResult<Reading>,
}

impl Sample {
    /// Log line in the form `0: 52.00 C, 125.60 F`
    pub fn describe(&self) -> String {
        match &self.reading {
            Ok(Reading::Value(c)) => {
                format!("{}: {:.2} C, {:.2} F", self.index, c, convert_c_to_f(*c))
            }
            Ok(Reading::Absent(_)) => format!("{}: sensor not available", self.index),
            Err(e) => format!("{}: read failed: {}", self.index, e),
        }
    }
}

/// Read every registered sensor once, holding the registry lock.
pub fn sample_once(registry: &Max6675Registry) -> Vec<Sample> {
    let _guard = registry.lock();
    let mut samples = Vec::with_capacity(registry.sensor_count());
    registry.for_each_sensor(|index, sensor| {
        samples.push(Sample {
            index,
            label: sensor.label().to_string(),
            reading: sensor.read_value(),
        });
    });
    samples
}

/// Poll all sensors every `period` and log each result.
pub fn spawn_sampling(registry: &'static Max6675Registry, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("[scheduler] sampling {} sensor(s) every {:?}", registry.sensor_count(), period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            for sample in sample_once(registry) {
                match sample.reading {
                    Err(_) => warn!("[{}] {}", sample.label, sample.describe()),
                    Ok(_) => info!("[{}] {}", sample.label, sample.describe()),
                }
            }
        }
    })
}
