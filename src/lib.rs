//! # mcp2210-hid
//!
//! A Rust crate for driving the Microchip MCP2210 USB-to-SPI bridge (with
//! GPIO and user EEPROM) through its USB HID interface.
//!
//! This crate uses the `hidapi` crate for cross-platform USB HID communication.
//!
//! ## Features
//!
//! *   Device discovery (`device_find`, `device_find_all`).
//! *   Flexible device opening (`open_first`, `open_by_vid_pid`, `open_by_path`, `from_hid_device`).
//! *   Any byte transport through the [`Transport`] trait (`Mcp2210::with_config`).
//! *   SPI transfers of up to 65535 bytes (`spi_transfer`), chunked into
//!     60-byte reports with bounded busy-retry.
//! *   Cached, write-through access to:
//!     *   current and power-up chip settings (pin designations, GPIO defaults, interrupt mode, access control),
//!     *   current and power-up SPI settings (bit rate, chip select, delays, mode),
//!     *   power-up USB key parameters (VID, PID, power),
//!     *   USB manufacturer and product strings.
//! *   GPIO control (GP0-GP8):
//!     *   Strongly-typed `GpioPin` struct.
//!     *   Whole-word access (`gpio_values_raw`, `gpio_direction_raw`).
//!     *   Single pin direction and level (`gpio_set_direction`, `gpio_write`, `gpio_read`).
//! *   User EEPROM (`eeprom().read`, `write`, `read_range`, `write_range`).
//! *   Password authentication, chip status, interrupt event counter and SPI bus release.
//! *   Raw command access (`send_command`, `exchange`).
//!
//! ## Basic Usage
//!
//! ```no_run
//! use hidapi::HidApi;
//! use mcp2210_hid::{GpioDirection, GpioLevel, GpioPin, Mcp2210, Result};
//!
//! fn main() -> Result<()> {
//!     // Optional: Initialize logging
//!     // env_logger::init();
//!
//!     let hid_api = HidApi::new()?;
//!     let mut device = Mcp2210::open_first(&hid_api)?;
//!     println!("Product: {}", device.product_name()?);
//!
//!     // --- SPI ---
//!     let rx = device.spi_transfer(b"HELLO WORLD")?;
//!     println!("Received: {:02X?}", rx);
//!
//!     // --- EEPROM ---
//!     device.eeprom().write_range(10, &[2, 4, 8, 16])?;
//!     assert_eq!(device.eeprom().read_range(10..14)?, [2, 4, 8, 16]);
//!     assert_eq!(device.eeprom().read(12)?, 8);
//!
//!     // --- GPIO (pin must be designated as GPIO in the chip settings) ---
//!     let pin = GpioPin::new(0)?;
//!     device.gpio_set_direction(pin, GpioDirection::Output)?;
//!     device.gpio_write(pin, GpioLevel::High)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Settings
//!
//! Settings are read once and then served from a local cache. Setters store
//! the new value in the cache and send it to the chip; if the chip rejects it
//! the setter returns the error and `invalidate_cache` re-reads the chip:
//!
//! ```no_run
//! # use mcp2210_hid::{Mcp2210, PinDesignation, Result};
//! # fn main() -> Result<()> {
//! # let hid_api = hidapi::HidApi::new()?;
//! # let mut device = Mcp2210::open_first(&hid_api)?;
//! let mut settings = device.boot_chip_settings()?;
//! settings.pin_designations[0] = PinDesignation::ChipSelect;
//! device.set_boot_chip_settings(settings)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Hardware Setup Notes
//!
//! *   **Linux udev Rules:** Grant user permission to the HID device. Create `/etc/udev/rules.d/99-mcp2210.rules`:
//!     ```udev
//!     SUBSYSTEM=="hidraw", ATTRS{idVendor}=="04d8", ATTRS{idProduct}=="00de", MODE="0666", GROUP="plugdev"
//!     ```
//!     Reload: `sudo udevadm control --reload-rules && sudo udevadm trigger`
//! *   **Windows:** Outgoing reports need a leading zero byte; this is the
//!     default there (`Config::with_pad_byte`).

mod consts;
mod error;

pub mod command;
pub mod config;
pub mod device;
pub mod eeprom;
pub mod gpio;
pub mod property;
pub mod report;
pub mod response;
pub mod settings;
pub mod spi;
pub mod status;
pub mod transport;

pub use command::{Command, CommandKind, ResponseShape, SpiChunk};
pub use config::{Config, TransferConfig};
pub use device::{device_find, device_find_all, Mcp2210, Mcp2210DeviceInfo};
pub use eeprom::Eeprom;
pub use error::{Error, Result};
pub use gpio::{GpioDirection, GpioLevel, GpioPin};
pub use report::Report;
pub use response::{Response, ResponseBody, SpiEngineStatus};
pub use settings::{
    AccessControl, BusOwner, ChipSettings, ChipStatus, DeviceString, InterruptMode, Password,
    PinDesignation, SpiMode, SpiSettings, UsbSettings,
};
pub use status::{classify, Status, StatusCode};
pub use transport::{Framing, HidTransport, Transport};
// Re-export only essential public constants
pub use consts::{MCP2210_PID, MICROCHIP_VID, REPORT_SIZE};
