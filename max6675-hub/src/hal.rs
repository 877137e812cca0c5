/// Hardware Abstraction Layer (HAL) for platform-specific SPI access
///
/// The driver itself only depends on `embedded-hal` traits; this module
/// re-exports the concrete types of the active platform backend.

#[cfg(feature = "linux-hal")]
pub mod linux {
    // Re-export linux-embedded-hal types directly
    pub use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
    pub use linux_embedded_hal::sysfs_gpio::{Direction, Error as SysfsError};
    pub use linux_embedded_hal::{SpidevBus, SysfsPin};
}

// Re-export the active platform's HAL
#[cfg(feature = "linux-hal")]
pub use linux::*;
