//! Linux backend: `/dev/spidevX.Y` plus sysfs GPIO chip selects.

use embedded_hal::spi::{Phase, Polarity};
use tracing::info;

use super::embedded::{ConfigureSpi, HalHost};
use super::{BitOrder, PinId, SpiSettings};
use crate::errors::{BusError, BusResult};
use crate::hal::{Direction, Spidev, SpidevBus, SpidevOptions, SpiModeFlags, SysfsPin};

pub type SpidevHost = HalHost<SpidevBus, SysfsPin>;

impl ConfigureSpi for SpidevBus {
    fn apply_settings(&mut self, settings: &SpiSettings) -> Result<(), String> {
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(settings.clock_hz)
            .lsb_first(settings.bit_order == BitOrder::LsbFirst)
            .mode(spidev_mode(settings))
            .build();
        self.0.configure(&options).map_err(|e| e.to_string())
    }
}

/// Chip selects are GPIOs driven by the host, so the controller's own CE line
/// stays idle (`SPI_NO_CS`). Otherwise CE0 would pulse on every transfer.
fn spidev_mode(settings: &SpiSettings) -> SpiModeFlags {
    let mode = match (settings.mode.polarity, settings.mode.phase) {
        (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => SpiModeFlags::SPI_MODE_0,
        (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => SpiModeFlags::SPI_MODE_1,
        (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => SpiModeFlags::SPI_MODE_2,
        (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => SpiModeFlags::SPI_MODE_3,
    };
    mode | SpiModeFlags::SPI_NO_CS
}

/// Open a spidev node; chip selects are exported through sysfs on first use.
pub fn open_spidev(name: &str, path: &str) -> BusResult<SpidevHost> {
    let spidev = Spidev::open(path).map_err(|source| BusError::Open {
        path: path.to_string(),
        source,
    })?;
    info!("[bus] {}: opened {}", name, path);

    let bus_name = name.to_string();
    Ok(HalHost::new(name, SpidevBus(spidev)).with_pin_factory(move |pin: PinId| {
        export_output(&bus_name, pin)
    }))
}

fn export_output(bus: &str, pin: PinId) -> BusResult<SysfsPin> {
    let gpio = SysfsPin::new(u64::from(pin.0));
    let invalid = |e: crate::hal::SysfsError| BusError::PinWrite {
        bus: bus.to_string(),
        pin,
        reason: e.to_string(),
    };
    gpio.0.export().map_err(invalid)?;
    // Direction::High switches to output already driven high.
    gpio.0.set_direction(Direction::High).map_err(invalid)?;
    Ok(gpio)
}
