//! Settings records carried by the chip, SPI and USB commands.
//!
//! The MCP2210 keeps two copies of its chip and SPI settings: the power-up
//! ("boot") copy in NVRAM and the runtime copy in volatile memory. Both use the
//! same record layouts, so one type serves each pair.

use crate::consts::{self, usb_string, PASSWORD_LEN};
use crate::error::{Error, Result};
use crate::report::{read_u16, read_u32, Report};

/// Byte length of an encoded [`SpiSettings`] record.
pub(crate) const SPI_SETTINGS_LEN: usize = 17;
/// Byte length of an encoded [`ChipSettings`] record.
pub(crate) const CHIP_SETTINGS_LEN: usize = 15;

/// SPI clock polarity/phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    pub fn raw(self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }

    /// Only the two low bits are significant.
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0x03 {
            0 => SpiMode::Mode0,
            1 => SpiMode::Mode1,
            2 => SpiMode::Mode2,
            _ => SpiMode::Mode3,
        }
    }
}

/// SPI transfer settings (runtime or power-up).
///
/// Delays are in units of 100 µs. Chip-select words hold one bit per GP pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSettings {
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    /// Chip-select levels while idle.
    pub idle_cs: u16,
    /// Chip-select levels during a transfer.
    pub active_cs: u16,
    /// Delay from chip-select assertion to the first data byte.
    pub cs_to_data_delay: u16,
    /// Delay from the last data byte to chip-select release.
    pub data_to_cs_delay: u16,
    /// Delay between consecutive data bytes.
    pub inter_byte_delay: u16,
    /// Number of bytes in one SPI transaction. The transfer engine sets this
    /// before every transfer.
    pub bytes_per_transaction: u16,
    /// Clock polarity and phase.
    pub mode: SpiMode,
}

impl Default for SpiSettings {
    /// Factory defaults of the chip.
    fn default() -> Self {
        SpiSettings {
            bit_rate: 12_000_000,
            idle_cs: 0x01FF,
            active_cs: 0x0000,
            cs_to_data_delay: 1,
            data_to_cs_delay: 1,
            inter_byte_delay: 1,
            bytes_per_transaction: 4,
            mode: SpiMode::Mode0,
        }
    }
}

impl SpiSettings {
    pub(crate) fn write_to(&self, report: &mut Report, offset: usize) {
        report.set_u32(offset, self.bit_rate);
        report.set_u16(offset + 4, self.idle_cs);
        report.set_u16(offset + 6, self.active_cs);
        report.set_u16(offset + 8, self.cs_to_data_delay);
        report.set_u16(offset + 10, self.data_to_cs_delay);
        report.set_u16(offset + 12, self.inter_byte_delay);
        report.set_u16(offset + 14, self.bytes_per_transaction);
        report.set_byte(offset + 16, self.mode.raw());
    }

    pub(crate) fn read_from(frame: &[u8], offset: usize) -> Self {
        SpiSettings {
            bit_rate: read_u32(frame, offset),
            idle_cs: read_u16(frame, offset + 4),
            active_cs: read_u16(frame, offset + 6),
            cs_to_data_delay: read_u16(frame, offset + 8),
            data_to_cs_delay: read_u16(frame, offset + 10),
            inter_byte_delay: read_u16(frame, offset + 12),
            bytes_per_transaction: read_u16(frame, offset + 14),
            mode: SpiMode::from_raw(frame[offset + 16]),
        }
    }
}

/// Function assigned to a GP pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinDesignation {
    #[default]
    Gpio,
    ChipSelect,
    /// The pin's dedicated function (LED, interrupt input, bus release ...).
    Dedicated,
    /// Value not defined by the datasheet, kept for round-tripping.
    Unknown(u8),
}

impl PinDesignation {
    pub fn raw(self) -> u8 {
        match self {
            PinDesignation::Gpio => 0x00,
            PinDesignation::ChipSelect => 0x01,
            PinDesignation::Dedicated => 0x02,
            PinDesignation::Unknown(raw) => raw,
        }
    }

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => PinDesignation::Gpio,
            0x01 => PinDesignation::ChipSelect,
            0x02 => PinDesignation::Dedicated,
            other => PinDesignation::Unknown(other),
        }
    }
}

/// What the dedicated interrupt pin (GP6) counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptMode {
    #[default]
    None,
    FallingEdges,
    RisingEdges,
    LowPulses,
    HighPulses,
    Reserved(u8),
}

impl InterruptMode {
    pub fn raw(self) -> u8 {
        match self {
            InterruptMode::None => 0b000,
            InterruptMode::FallingEdges => 0b001,
            InterruptMode::RisingEdges => 0b010,
            InterruptMode::LowPulses => 0b011,
            InterruptMode::HighPulses => 0b100,
            InterruptMode::Reserved(raw) => raw & 0b111,
        }
    }

    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b111 {
            0b000 => InterruptMode::None,
            0b001 => InterruptMode::FallingEdges,
            0b010 => InterruptMode::RisingEdges,
            0b011 => InterruptMode::LowPulses,
            0b100 => InterruptMode::HighPulses,
            other => InterruptMode::Reserved(other),
        }
    }
}

/// NVRAM access protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessControl {
    #[default]
    Unprotected,
    PasswordProtected,
    /// Permanently locked. Cannot be undone.
    Locked,
    Unknown(u8),
}

impl AccessControl {
    pub fn raw(self) -> u8 {
        match self {
            AccessControl::Unprotected => 0x00,
            AccessControl::PasswordProtected => 0x40,
            AccessControl::Locked => 0x80,
            AccessControl::Unknown(raw) => raw,
        }
    }

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => AccessControl::Unprotected,
            0x40 => AccessControl::PasswordProtected,
            0x80 => AccessControl::Locked,
            other => AccessControl::Unknown(other),
        }
    }
}

/// GP pin designations, default GPIO state and miscellaneous chip options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipSettings {
    /// Function of GP0..GP8.
    pub pin_designations: [PinDesignation; consts::gpio::PIN_COUNT as usize],
    /// GPIO output levels applied when the settings take effect.
    pub gpio_output: u16,
    /// GPIO directions applied when the settings take effect (1 = input).
    pub gpio_direction: u16,
    /// Wake the host from suspend on a GPIO change.
    pub remote_wakeup: bool,
    /// Edges counted on the GP6 interrupt input.
    pub interrupt_mode: InterruptMode,
    /// Bit 0 of the options byte, controlling SPI bus release between transfers.
    pub spi_bus_release: bool,
    /// Protection of the power-up settings.
    pub access_control: AccessControl,
}

impl ChipSettings {
    pub(crate) fn write_to(&self, report: &mut Report, offset: usize) {
        for (i, designation) in self.pin_designations.iter().enumerate() {
            report.set_byte(offset + i, designation.raw());
        }
        report.set_u16(offset + 9, self.gpio_output);
        report.set_u16(offset + 11, self.gpio_direction);
        let options = (u8::from(self.remote_wakeup) << 4)
            | (self.interrupt_mode.raw() << 1)
            | u8::from(self.spi_bus_release);
        report.set_byte(offset + 13, options);
        report.set_byte(offset + 14, self.access_control.raw());
    }

    pub(crate) fn read_from(frame: &[u8], offset: usize) -> Self {
        let mut pin_designations = [PinDesignation::Gpio; consts::gpio::PIN_COUNT as usize];
        for (i, designation) in pin_designations.iter_mut().enumerate() {
            *designation = PinDesignation::from_raw(frame[offset + i]);
        }
        let options = frame[offset + 13];
        ChipSettings {
            pin_designations,
            gpio_output: read_u16(frame, offset + 9),
            gpio_direction: read_u16(frame, offset + 11),
            remote_wakeup: options & (1 << 4) != 0,
            interrupt_mode: InterruptMode::from_raw(options >> 1),
            spi_bus_release: options & 1 != 0,
            access_control: AccessControl::from_raw(frame[offset + 14]),
        }
    }
}

/// USB enumeration parameters stored in NVRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbSettings {
    /// Vendor ID reported at enumeration.
    pub vid: u16,
    /// Product ID reported at enumeration.
    pub pid: u16,
    /// USB configuration attributes byte (bit 7 host powered, bit 6 self
    /// powered, bit 5 remote wake-up capable).
    pub power_attributes: u8,
    /// Requested bus current in units of 2 mA.
    pub current_units: u8,
}

impl UsbSettings {
    /// Requested bus current in milliamps.
    pub fn current_ma(&self) -> u16 {
        u16::from(self.current_units) * 2
    }

    /// Sets the requested bus current, rounding down to the 2 mA resolution.
    pub fn set_current_ma(&mut self, milliamps: u16) -> Result<()> {
        let units = milliamps / 2;
        self.current_units = u8::try_from(units).map_err(|_| {
            Error::ArgumentOutOfRange(format!("USB current {} mA out of range (0-510)", milliamps))
        })?;
        Ok(())
    }
}

impl Default for UsbSettings {
    fn default() -> Self {
        UsbSettings {
            vid: consts::MICROCHIP_VID,
            pid: consts::MCP2210_PID,
            power_attributes: 0x80,
            current_units: 50,
        }
    }
}

/// A USB manufacturer or product string, limited to 29 UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceString(String);

impl DeviceString {
    pub fn new(value: &str) -> Result<Self> {
        let units = value.encode_utf16().count();
        if units > usb_string::MAX_CHARS {
            return Err(Error::OperationTooLarge {
                max: usb_string::MAX_CHARS,
                actual: units,
            });
        }
        Ok(DeviceString(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn write_to(&self, report: &mut Report) {
        let mut offset = usb_string::CHARS_OFFSET;
        for unit in self.0.encode_utf16() {
            report.set_u16(offset, unit);
            offset += 2;
        }
        let descriptor_len = (offset - usb_string::CHARS_OFFSET + 2) as u8;
        report.set_byte(usb_string::LENGTH_OFFSET, descriptor_len);
        report.set_byte(usb_string::LENGTH_OFFSET + 1, usb_string::DESCRIPTOR_TYPE);
    }

    /// Number of bytes a frame must have to hold the string it announces.
    pub(crate) fn required_len(frame: &[u8]) -> usize {
        usb_string::CHARS_OFFSET + 2 * Self::announced_chars(frame)
    }

    fn announced_chars(frame: &[u8]) -> usize {
        let descriptor_len = usize::from(frame[usb_string::LENGTH_OFFSET]);
        (descriptor_len.saturating_sub(2) / 2).min(usb_string::MAX_CHARS)
    }

    /// Decodes the string; the caller has checked [`DeviceString::required_len`].
    pub(crate) fn read_from(frame: &[u8]) -> std::result::Result<Self, String> {
        let chars = Self::announced_chars(frame);
        let units: Vec<u16> = (0..chars)
            .map(|i| read_u16(frame, usb_string::CHARS_OFFSET + 2 * i))
            .collect();
        String::from_utf16(&units)
            .map(DeviceString)
            .map_err(|e| format!("invalid UTF-16 string descriptor: {}", e))
    }
}

impl std::fmt::Display for DeviceString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An NVRAM access password: up to 8 ASCII characters, zero padded.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Password([u8; PASSWORD_LEN]);

impl Password {
    pub fn new(password: &str) -> Result<Self> {
        if !password.is_ascii() {
            return Err(Error::ArgumentOutOfRange(
                "password must be ASCII".to_string(),
            ));
        }
        if password.len() > PASSWORD_LEN {
            return Err(Error::OperationTooLarge {
                max: PASSWORD_LEN,
                actual: password.len(),
            });
        }
        let mut bytes = [0u8; PASSWORD_LEN];
        bytes[..password.len()].copy_from_slice(password.as_bytes());
        Ok(Password(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PASSWORD_LEN] {
        &self.0
    }

    pub(crate) fn from_bytes(bytes: [u8; PASSWORD_LEN]) -> Self {
        Password(bytes)
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(..)")
    }
}

/// Current owner of the SPI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOwner {
    None,
    /// The MCP2210 itself (USB host side).
    Bridge,
    /// An external SPI master.
    External,
    Unknown(u8),
}

impl BusOwner {
    pub fn raw(self) -> u8 {
        match self {
            BusOwner::None => 0x00,
            BusOwner::Bridge => 0x01,
            BusOwner::External => 0x02,
            BusOwner::Unknown(raw) => raw,
        }
    }

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => BusOwner::None,
            0x01 => BusOwner::Bridge,
            0x02 => BusOwner::External,
            other => BusOwner::Unknown(other),
        }
    }
}

/// Chip status reported by Get Chip Status and Cancel Transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipStatus {
    /// An external master has asked the chip to release the SPI bus.
    pub bus_release_pending: bool,
    /// Who currently drives the SPI bus.
    pub bus_owner: BusOwner,
    /// Failed password attempts since power-up.
    pub password_attempts: u8,
    /// The correct password has been supplied.
    pub password_guessed: bool,
}

impl ChipStatus {
    pub(crate) fn write_to(&self, report: &mut Report) {
        report.set_byte(2, if self.bus_release_pending { 0x00 } else { 0x01 });
        report.set_byte(3, self.bus_owner.raw());
        report.set_byte(4, self.password_attempts);
        report.set_byte(5, u8::from(self.password_guessed));
    }

    pub(crate) fn read_from(frame: &[u8]) -> Self {
        ChipStatus {
            bus_release_pending: frame[2] == 0x00,
            bus_owner: BusOwner::from_raw(frame[3]),
            password_attempts: frame[4],
            password_guessed: frame[5] != 0,
        }
    }
}
