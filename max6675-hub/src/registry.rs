//! Process-wide owner of MAX6675 sensors.
//!
//! Sensors are added before [`Max6675Registry::setup`], which binds every
//! chip select in insertion order and starts the background worker. The
//! registry also carries one re-entrant lock that callers take around
//! multi-step sequences on shared buses; reads themselves never take it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use tracing::{error, info, warn};

use crate::bus::SpiBusHandle;
use crate::config::SensorFile;
use crate::errors::{ConfigError, RegistryError, RegistryResult, SensorError, SensorResult};
use crate::sensors::{Max6675, Reading, SensorConfig};
use crate::worker::{BackgroundWorker, WorkerSpawner, WORKER_NAME, WORKER_PERIOD};

static REGISTRY: OnceLock<Max6675Registry> = OnceLock::new();

/// Outcome of [`Max6675Registry::setup`]
#[derive(Debug, Default)]
pub struct SetupReport {
    pub initialized: Vec<usize>,
    pub failures: Vec<(usize, SensorError)>,
}

impl SetupReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|(index, _)| *index).collect()
    }

    /// Turn any per-sensor failure into [`RegistryError::PartialInit`].
    pub fn into_result(self) -> RegistryResult<Vec<usize>> {
        if self.failures.is_empty() {
            Ok(self.initialized)
        } else {
            Err(RegistryError::PartialInit {
                failures: self.failures,
            })
        }
    }
}

pub struct Max6675Registry {
    sensors: RwLock<Vec<Max6675>>,
    lock: ReentrantMutex<()>,
    setup_done: AtomicBool,
    worker: OnceLock<BackgroundWorker>,
    worker_period: Duration,
    spawn_worker: WorkerSpawner,
}

impl Default for Max6675Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Max6675Registry {
    /// A standalone registry. Most callers want [`instance`](Self::instance).
    pub fn new() -> Self {
        Self::with_worker_period(WORKER_PERIOD)
    }

    pub fn with_worker_period(worker_period: Duration) -> Self {
        Self {
            sensors: RwLock::new(Vec::new()),
            lock: ReentrantMutex::new(()),
            setup_done: AtomicBool::new(false),
            worker: OnceLock::new(),
            worker_period,
            spawn_worker: BackgroundWorker::spawn,
        }
    }

    pub fn with_worker_spawner(mut self, spawner: WorkerSpawner) -> Self {
        self.spawn_worker = spawner;
        self
    }

    /// The process-wide registry, created on first use.
    pub fn instance() -> &'static Max6675Registry {
        REGISTRY.get_or_init(Max6675Registry::new)
    }

    pub fn is_setup(&self) -> bool {
        self.setup_done.load(Ordering::Acquire)
    }

    /// Append a sensor and return its index.
    ///
    /// After `setup()` the sensor is still stored but stays uninitialized,
    /// and the call reports [`RegistryError::LateRegistration`].
    pub fn add_sensor(&self, config: SensorConfig) -> RegistryResult<usize> {
        let mut sensors = self.sensors.write();
        let sensor = Max6675::new(config);
        let index = sensors.len();
        let late = self.setup_done.load(Ordering::Acquire);
        info!(
            "[registry] registering sensor #{}: {} cs={}",
            index,
            sensor.label(),
            sensor.chip_select()
        );
        sensors.push(sensor);

        if late {
            warn!("[registry] sensor #{} added after setup, left uninitialized", index);
            return Err(RegistryError::LateRegistration { index });
        }
        Ok(index)
    }

    /// Register every `[[sensor]]` entry, resolving bus ids against `buses`.
    pub fn register_all(
        &self,
        file: &SensorFile,
        buses: &HashMap<String, SpiBusHandle>,
    ) -> RegistryResult<Vec<usize>> {
        let mut indices = Vec::with_capacity(file.sensors.len());
        for entry in &file.sensors {
            let bus = buses.get(&entry.bus).ok_or_else(|| ConfigError::UnknownBus {
                sensor: entry.id.clone(),
                bus: entry.bus.clone(),
            })?;
            indices.push(self.add_sensor(entry.to_sensor_config(bus.clone()))?);
        }
        Ok(indices)
    }

    /// Start the worker, then initialize every sensor in insertion order.
    ///
    /// A sensor that fails to initialize is recorded in the report and the
    /// remaining sensors are still initialized. If the worker cannot be
    /// started nothing is committed and `setup()` may be called again.
    pub fn setup(&self) -> RegistryResult<SetupReport> {
        let mut sensors = self.sensors.write();
        if self.setup_done.load(Ordering::Acquire) {
            return Err(RegistryError::AlreadySetUp);
        }

        let worker = (self.spawn_worker)(WORKER_NAME, self.worker_period).map_err(|e| {
            error!("[registry] background worker failed to start: {}", e);
            RegistryError::WorkerSpawn(e)
        })?;
        // The write lock is held and setup_done is false, so the cell is empty.
        let _ = self.worker.set(worker);
        self.setup_done.store(true, Ordering::Release);

        info!("[registry] initializing {} sensors...", sensors.len());
        let mut report = SetupReport::default();
        for (index, sensor) in sensors.iter_mut().enumerate() {
            match sensor.initialize() {
                Ok(()) => report.initialized.push(index),
                Err(e) => {
                    error!("[registry] sensor #{} ({}) failed: {}", index, sensor.label(), e);
                    report.failures.push((index, e));
                }
            }
        }
        drop(sensors);

        info!(
            "[registry] setup complete: {} ok, {} failed",
            report.initialized.len(),
            report.failures.len()
        );
        Ok(report)
    }

    pub fn worker(&self) -> Option<&BackgroundWorker> {
        self.worker.get()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.read().len()
    }

    /// Visit every sensor in insertion order.
    ///
    /// The sensor list is read-locked for the duration; the visitor must not
    /// call `add_sensor` or `setup` on the same registry.
    pub fn for_each_sensor<F>(&self, mut visitor: F)
    where
        F: FnMut(usize, &Max6675),
    {
        for (index, sensor) in self.sensors.read().iter().enumerate() {
            visitor(index, sensor);
        }
    }

    pub fn with_sensor<R, F>(&self, index: usize, f: F) -> RegistryResult<R>
    where
        F: FnOnce(&Max6675) -> R,
    {
        let sensors = self.sensors.read();
        let sensor = sensors
            .get(index)
            .ok_or(RegistryError::NoSuchSensor { index })?;
        Ok(f(sensor))
    }

    /// Read every sensor in Celsius while holding the registry lock.
    pub fn read_all(&self) -> Vec<SensorResult<Reading>> {
        let _guard = self.lock();
        let mut readings = Vec::with_capacity(self.sensor_count());
        self.for_each_sensor(|_, sensor| readings.push(sensor.read_value()));
        readings
    }

    /// Take the shared re-entrant lock. Dropping the guard releases one level.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub fn try_lock(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.lock.try_lock()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}
