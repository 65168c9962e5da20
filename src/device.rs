//! Device discovery and the [`Mcp2210`] session.

use crate::command::Command;
use crate::config::Config;
use crate::consts::{self, REPORT_SIZE};
use crate::error::{Error, Result};
use crate::property::{remote, CommandChannel, RemoteProperty};
use crate::response::{unexpected_body, Response, ResponseBody};
use crate::settings::{
    ChipSettings, ChipStatus, DeviceString, Password, SpiSettings, UsbSettings,
};
use crate::transport::{HidTransport, Transport};
use hidapi::{HidApi, HidDevice};
use log::{debug, trace, warn};
use std::ffi::{CStr, CString};

/// Information about a discovered MCP2210.
#[derive(Debug, Clone)]
pub struct Mcp2210DeviceInfo {
    /// USB vendor ID.
    pub vid: u16,
    /// USB product ID.
    pub pid: u16,
    /// Platform-specific path. Use this for reliable opening.
    pub path: CString,
    /// USB serial number, if the device reports one.
    pub serial_number: Option<String>,
    /// USB product string.
    pub product_string: Option<String>,
    /// USB manufacturer string.
    pub manufacturer_string: Option<String>,
}

/// Finds all HID devices matching `vid`/`pid`, sorted by serial number.
///
/// Devices without a serial number come last, in enumeration order.
pub fn device_find(hid_api: &HidApi, vid: u16, pid: u16) -> Vec<Mcp2210DeviceInfo> {
    let mut devices: Vec<Mcp2210DeviceInfo> = hid_api
        .device_list()
        .filter(|info| info.vendor_id() == vid && info.product_id() == pid)
        .map(|info| {
            debug!(
                "Found MCP2210: VID={:04X}, PID={:04X}, Path={:?}, SN={:?}",
                info.vendor_id(),
                info.product_id(),
                info.path(),
                info.serial_number()
            );
            Mcp2210DeviceInfo {
                vid: info.vendor_id(),
                pid: info.product_id(),
                path: info.path().to_owned(),
                serial_number: info.serial_number().map(|s| s.to_string()),
                product_string: info.product_string().map(|s| s.to_string()),
                manufacturer_string: info.manufacturer_string().map(|s| s.to_string()),
            }
        })
        .collect();
    sort_by_serial(&mut devices);
    devices
}

fn sort_by_serial(devices: &mut [Mcp2210DeviceInfo]) {
    devices.sort_by(|a, b| match (&a.serial_number, &b.serial_number) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Finds all MCP2210s with the default Microchip VID/PID.
pub fn device_find_all(hid_api: &HidApi) -> Vec<Mcp2210DeviceInfo> {
    device_find(hid_api, consts::MICROCHIP_VID, consts::MCP2210_PID)
}

/// Sends requests and reads their responses, one at a time.
pub(crate) struct Link<T> {
    pub(crate) transport: T,
}

impl<T: Transport> Link<T> {
    pub(crate) fn exchange(&mut self, command: &Command) -> Result<Response> {
        let kind = command.kind();
        let report = command.encode();
        trace!("-> {}: {:02X?}", kind, report.as_ref());
        self.transport.write(report.as_ref())?;

        let mut buf = [0u8; REPORT_SIZE];
        let len = self.transport.read(&mut buf)?.min(REPORT_SIZE);
        if len != REPORT_SIZE {
            warn!(
                "Unexpected response length for {}: {} (expected {})",
                kind, len, REPORT_SIZE
            );
        }
        trace!("<- {}: {:02X?}", kind, &buf[..len]);
        Response::decode(kind, &buf[..len])
    }
}

impl<T: Transport> CommandChannel for Link<T> {
    fn send_command(&mut self, command: &Command) -> Result<ResponseBody> {
        self.exchange(command)?.check()
    }
}

/// Cached chip-side values owned by a session.
#[derive(Debug, Default)]
pub(crate) struct Properties {
    pub(crate) manufacturer: RemoteProperty<remote::Manufacturer>,
    pub(crate) product: RemoteProperty<remote::Product>,
    pub(crate) boot_chip: RemoteProperty<remote::BootChip>,
    pub(crate) chip: RemoteProperty<remote::Chip>,
    pub(crate) boot_spi: RemoteProperty<remote::BootSpi>,
    pub(crate) spi: RemoteProperty<remote::Spi>,
    pub(crate) boot_usb: RemoteProperty<remote::BootUsb>,
    pub(crate) gpio_direction: RemoteProperty<remote::GpioDirections>,
    pub(crate) gpio_values: RemoteProperty<remote::GpioValues>,
}

/// A session with one MCP2210.
///
/// The session exclusively owns its transport; every operation is a blocking
/// request/response exchange and takes `&mut self`. Chip settings, SPI
/// settings, USB settings, USB strings and both GPIO words are cached after
/// the first read and written through on every set.
pub struct Mcp2210<T: Transport = HidTransport> {
    pub(crate) link: Link<T>,
    pub(crate) props: Properties,
    pub(crate) config: Config,
}

impl<T: Transport> std::fmt::Debug for Mcp2210<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mcp2210")
            .field("config", &self.config)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

impl Mcp2210<HidTransport> {
    // --- Constructors ---

    /// Opens the first device with the default Microchip VID/PID.
    /// **Warning:** Ambiguous if multiple devices exist.
    pub fn open_first(hid_api: &HidApi) -> Result<Self> {
        Self::open_by_vid_pid(hid_api, consts::MICROCHIP_VID, consts::MCP2210_PID)
    }

    /// Opens a device by Vendor ID and Product ID. **Warning:** Ambiguous if multiple devices match.
    pub fn open_by_vid_pid(hid_api: &HidApi, vid: u16, pid: u16) -> Result<Self> {
        Self::open_by_vid_pid_with_config(hid_api, vid, pid, Config::default())
    }

    pub fn open_by_vid_pid_with_config(
        hid_api: &HidApi,
        vid: u16,
        pid: u16,
        config: Config,
    ) -> Result<Self> {
        debug!("Opening MCP2210 VID={:04X}, PID={:04X}", vid, pid);
        let device = hid_api.open(vid, pid).map_err(|e| {
            debug!("open({:04X}, {:04X}) failed: {}", vid, pid, e);
            Error::DeviceNotFound
        })?;
        Self::from_hid_device(device, config)
    }

    /// Opens a device by its platform-specific path.
    pub fn open_by_path(hid_api: &HidApi, path: &CStr) -> Result<Self> {
        Self::open_by_path_with_config(hid_api, path, Config::default())
    }

    pub fn open_by_path_with_config(hid_api: &HidApi, path: &CStr, config: Config) -> Result<Self> {
        let device = hid_api
            .open_path(path)
            .map_err(|e| Error::DeviceNotFoundByPath {
                path: format!("{:?}", path),
                message: format!("{}", e),
            })?;
        Self::from_hid_device(device, config)
    }

    /// Opens a device found by [`device_find`].
    pub fn open(hid_api: &HidApi, info: &Mcp2210DeviceInfo) -> Result<Self> {
        Self::open_by_path(hid_api, &info.path)
    }

    /// Wraps an already opened HID device.
    pub fn from_hid_device(device: HidDevice, config: Config) -> Result<Self> {
        let transport = HidTransport::new(device, config.framing, config.read_timeout_ms);
        Self::with_config(transport, config)
    }

    /// The underlying HID handle.
    pub fn hid_device(&self) -> &HidDevice {
        self.link.transport.device()
    }
}

impl<T: Transport> Mcp2210<T> {
    /// Starts a session over any transport.
    ///
    /// Cancels whatever SPI transfer a previous session may have left running,
    /// so the chip starts from a known state.
    pub fn with_config(transport: T, config: Config) -> Result<Self> {
        let mut device = Mcp2210 {
            link: Link { transport },
            props: Properties::default(),
            config,
        };
        device.cancel_transfer()?;
        debug!("MCP2210 session ready: {:?}", device.config);
        Ok(device)
    }

    /// Starts a session over any transport with the default configuration.
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.link.transport
    }

    /// Direct access to the transport. Cached values are not invalidated.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.link.transport
    }

    /// Ends the session and returns the transport.
    pub fn into_transport(self) -> T {
        self.link.transport
    }

    // --- Raw command access ---

    /// Sends `command` and returns the decoded response whatever its status.
    pub fn exchange(&mut self, command: &Command) -> Result<Response> {
        self.link.exchange(command)
    }

    /// Sends `command` and returns the response body, or the device error.
    pub fn send_command(&mut self, command: &Command) -> Result<ResponseBody> {
        self.link.send_command(command)
    }

    /// Drops every cached value so the next reads go to the chip.
    pub fn invalidate_cache(&mut self) {
        self.props = Properties::default();
    }

    // --- USB strings ---

    pub fn manufacturer_name(&mut self) -> Result<DeviceString> {
        self.props.manufacturer.get(&mut self.link)
    }

    pub fn set_manufacturer_name(&mut self, name: DeviceString) -> Result<()> {
        self.props.manufacturer.set(&mut self.link, name)
    }

    pub fn product_name(&mut self) -> Result<DeviceString> {
        self.props.product.get(&mut self.link)
    }

    pub fn set_product_name(&mut self, name: DeviceString) -> Result<()> {
        self.props.product.set(&mut self.link, name)
    }

    // --- Chip settings ---

    /// Chip settings loaded at power-up.
    pub fn boot_chip_settings(&mut self) -> Result<ChipSettings> {
        self.props.boot_chip.get(&mut self.link)
    }

    pub fn set_boot_chip_settings(&mut self, settings: ChipSettings) -> Result<()> {
        self.props.boot_chip.set(&mut self.link, settings)
    }

    /// Writes the power-up chip settings together with a new access password.
    pub fn set_boot_chip_settings_with_password(
        &mut self,
        settings: ChipSettings,
        password: Password,
    ) -> Result<()> {
        let command = Command::SetBootChipSettings {
            settings,
            new_password: Some(password),
        };
        self.props.boot_chip.push_with(&mut self.link, settings, &command)
    }

    /// Chip settings currently in effect.
    pub fn chip_settings(&mut self) -> Result<ChipSettings> {
        self.props.chip.get(&mut self.link)
    }

    /// Changes the current chip settings. The cached GPIO words are dropped
    /// because the settings carry new GPIO defaults.
    pub fn set_chip_settings(&mut self, settings: ChipSettings) -> Result<()> {
        let result = self.props.chip.set(&mut self.link, settings);
        self.props.gpio_direction.invalidate();
        self.props.gpio_values.invalidate();
        result
    }

    // --- SPI settings ---

    /// SPI settings loaded at power-up.
    pub fn boot_spi_settings(&mut self) -> Result<SpiSettings> {
        self.props.boot_spi.get(&mut self.link)
    }

    pub fn set_boot_spi_settings(&mut self, settings: SpiSettings) -> Result<()> {
        self.props.boot_spi.set(&mut self.link, settings)
    }

    /// SPI settings currently in effect.
    pub fn spi_settings(&mut self) -> Result<SpiSettings> {
        self.props.spi.get(&mut self.link)
    }

    pub fn set_spi_settings(&mut self, settings: SpiSettings) -> Result<()> {
        self.props.spi.set(&mut self.link, settings)
    }

    // --- USB key parameters ---

    pub fn boot_usb_settings(&mut self) -> Result<UsbSettings> {
        self.props.boot_usb.get(&mut self.link)
    }

    pub fn set_boot_usb_settings(&mut self, settings: UsbSettings) -> Result<()> {
        self.props.boot_usb.set(&mut self.link, settings)
    }

    // --- Access control and status ---

    /// Unlocks a password-protected chip for this power cycle.
    pub fn authenticate(&mut self, password: &Password) -> Result<()> {
        debug!("Sending access password");
        self.send_command(&Command::SendPassword(*password))?;
        Ok(())
    }

    /// Cancels any SPI transfer in progress and returns the chip status.
    pub fn cancel_transfer(&mut self) -> Result<ChipStatus> {
        debug!("Cancelling SPI transfer");
        self.chip_status_from(Command::CancelTransfer)
    }

    pub fn chip_status(&mut self) -> Result<ChipStatus> {
        self.chip_status_from(Command::GetChipStatus)
    }

    fn chip_status_from(&mut self, command: Command) -> Result<ChipStatus> {
        match self.send_command(&command)? {
            ResponseBody::ChipStatus(status) => {
                trace!("Chip status: {:?}", status);
                Ok(status)
            }
            other => Err(unexpected_body(command.kind(), &other)),
        }
    }

    /// Number of interrupt events counted on GP6, optionally resetting the counter.
    pub fn interrupt_event_count(&mut self, reset: bool) -> Result<u16> {
        let command = Command::GetInterruptCount { reset };
        match self.send_command(&command)? {
            ResponseBody::InterruptCount(count) => Ok(count),
            other => Err(unexpected_body(command.kind(), &other)),
        }
    }

    /// Asks the chip to release the SPI bus to an external master.
    /// `ack` is the level driven on the bus release acknowledge pin.
    pub fn request_bus_release(&mut self, ack: bool) -> Result<()> {
        debug!("Requesting SPI bus release (ack={})", ack);
        self.send_command(&Command::RequestBusRelease { ack })?;
        Ok(())
    }
}
