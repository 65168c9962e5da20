//! Request side of the codec: typed commands and their report layouts.
//!
//! Every [`Command`] variant has a [`CommandKind`], and every kind maps to
//! exactly one [`ResponseShape`]. Both mappings are exhaustive `match`es, so a
//! new command cannot be added without deciding how its response is decoded.

use crate::consts::{nvram, opcode, spi, PASSWORD_LEN};
use crate::error::{malformed, Error, Result};
use crate::report::{read_u16, Report};
use crate::settings::{
    ChipSettings, DeviceString, Password, SpiSettings, UsbSettings, CHIP_SETTINGS_LEN,
    SPI_SETTINGS_LEN,
};
use std::fmt;

/// Payload of one SPI transfer report: at most 60 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpiChunk(Vec<u8>);

impl SpiChunk {
    /// Copies `data` into a chunk, failing if it is longer than 60 bytes.
    pub fn new(data: &[u8]) -> Result<Self> {
        if data.len() > spi::MAX_CHUNK {
            return Err(Error::OperationTooLarge {
                max: spi::MAX_CHUNK,
                actual: data.len(),
            });
        }
        Ok(SpiChunk(data.to_vec()))
    }

    /// A chunk without payload, used to drain buffered receive data.
    pub fn empty() -> Self {
        SpiChunk(Vec::new())
    }

    /// The payload bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a drain request.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A request to the MCP2210.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reads bus release state, bus owner and password status.
    GetChipStatus,
    /// Cancels any SPI transfer in progress.
    CancelTransfer,
    /// Reads the interrupt event counter, optionally resetting it.
    GetInterruptCount {
        reset: bool,
    },
    /// Reads the chip settings currently in effect.
    GetChipSettings,
    /// Replaces the chip settings currently in effect.
    SetChipSettings(ChipSettings),
    /// Drives the GPIO output levels.
    SetGpioValue(u16),
    /// Samples the GPIO levels.
    GetGpioValue,
    /// Bit set = input.
    SetGpioDirection(u16),
    /// Reads the GPIO direction word.
    GetGpioDirection,
    /// Replaces the SPI settings currently in effect.
    SetSpiSettings(SpiSettings),
    /// Reads the SPI settings currently in effect.
    GetSpiSettings,
    /// Clocks one chunk out and returns whatever the chip has received.
    SpiTransfer(SpiChunk),
    /// Reads one EEPROM byte.
    ReadEeprom {
        address: u8,
    },
    /// Writes one EEPROM byte.
    WriteEeprom {
        address: u8,
        value: u8,
    },
    /// Reads the power-up SPI settings.
    GetBootSpiSettings,
    /// Stores the power-up SPI settings.
    SetBootSpiSettings(SpiSettings),
    /// Reads the power-up chip settings.
    GetBootChipSettings,
    /// Stores the power-up chip settings.
    SetBootChipSettings {
        settings: ChipSettings,
        /// Password installed together with the settings, if any.
        new_password: Option<Password>,
    },
    /// Reads the USB VID, PID and power parameters.
    GetBootUsbSettings,
    /// Stores the USB VID, PID and power parameters.
    SetBootUsbSettings(UsbSettings),
    /// Reads the USB product string.
    GetUsbProduct,
    /// Stores the USB product string.
    SetUsbProduct(DeviceString),
    /// Reads the USB manufacturer string.
    GetUsbManufacturer,
    /// Stores the USB manufacturer string.
    SetUsbManufacturer(DeviceString),
    /// Unlocks password-protected settings for this power cycle.
    SendPassword(Password),
    /// Releases the SPI bus to an external master; `ack` drives the
    /// bus-release acknowledge pin.
    RequestBusRelease {
        ack: bool,
    },
}

/// Identifies a command without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GetChipStatus,
    CancelTransfer,
    GetInterruptCount,
    GetChipSettings,
    SetChipSettings,
    SetGpioValue,
    GetGpioValue,
    SetGpioDirection,
    GetGpioDirection,
    SetSpiSettings,
    GetSpiSettings,
    SpiTransfer,
    ReadEeprom,
    WriteEeprom,
    GetBootSpiSettings,
    SetBootSpiSettings,
    GetBootChipSettings,
    SetBootChipSettings,
    GetBootUsbSettings,
    SetBootUsbSettings,
    GetUsbProduct,
    SetUsbProduct,
    GetUsbManufacturer,
    SetUsbManufacturer,
    SendPassword,
    RequestBusRelease,
}

/// Layout of the response paired with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Only the opcode echo and status.
    Status,
    ChipStatus,
    InterruptCount,
    ChipSettings,
    GpioWord,
    SpiSettings,
    /// Received SPI data; the length is carried in the report.
    SpiTransfer,
    EepromByte,
    UsbSettings,
    /// USB string descriptor; the length is carried in the report.
    UsbString,
}

impl ResponseShape {
    /// Minimum number of bytes a response of this shape occupies.
    pub fn min_len(self) -> usize {
        match self {
            ResponseShape::Status => 2,
            ResponseShape::ChipStatus => 6,
            ResponseShape::InterruptCount => 6,
            ResponseShape::ChipSettings => 4 + CHIP_SETTINGS_LEN,
            ResponseShape::GpioWord => 6,
            ResponseShape::SpiSettings => 4 + SPI_SETTINGS_LEN,
            ResponseShape::SpiTransfer => spi::DATA_OFFSET,
            ResponseShape::EepromByte => 4,
            ResponseShape::UsbSettings => 31,
            ResponseShape::UsbString => 6,
        }
    }
}

impl CommandKind {
    /// Opcode and, for NVRAM commands, sub-command.
    pub fn codes(self) -> (u8, Option<u8>) {
        use CommandKind::*;
        match self {
            GetChipStatus => (opcode::GET_CHIP_STATUS, None),
            CancelTransfer => (opcode::CANCEL_TRANSFER, None),
            GetInterruptCount => (opcode::GET_INTERRUPT_COUNT, None),
            GetChipSettings => (opcode::GET_CHIP_SETTINGS, None),
            SetChipSettings => (opcode::SET_CHIP_SETTINGS, None),
            SetGpioValue => (opcode::SET_GPIO_VALUE, None),
            GetGpioValue => (opcode::GET_GPIO_VALUE, None),
            SetGpioDirection => (opcode::SET_GPIO_DIRECTION, None),
            GetGpioDirection => (opcode::GET_GPIO_DIRECTION, None),
            SetSpiSettings => (opcode::SET_SPI_SETTINGS, None),
            GetSpiSettings => (opcode::GET_SPI_SETTINGS, None),
            SpiTransfer => (opcode::SPI_TRANSFER, None),
            ReadEeprom => (opcode::READ_EEPROM, None),
            WriteEeprom => (opcode::WRITE_EEPROM, None),
            GetBootSpiSettings => (opcode::GET_NVRAM, Some(nvram::SPI_SETTINGS)),
            SetBootSpiSettings => (opcode::SET_NVRAM, Some(nvram::SPI_SETTINGS)),
            GetBootChipSettings => (opcode::GET_NVRAM, Some(nvram::CHIP_SETTINGS)),
            SetBootChipSettings => (opcode::SET_NVRAM, Some(nvram::CHIP_SETTINGS)),
            GetBootUsbSettings => (opcode::GET_NVRAM, Some(nvram::USB_KEY_PARAMS)),
            SetBootUsbSettings => (opcode::SET_NVRAM, Some(nvram::USB_KEY_PARAMS)),
            GetUsbProduct => (opcode::GET_NVRAM, Some(nvram::USB_PRODUCT)),
            SetUsbProduct => (opcode::SET_NVRAM, Some(nvram::USB_PRODUCT)),
            GetUsbManufacturer => (opcode::GET_NVRAM, Some(nvram::USB_MANUFACTURER)),
            SetUsbManufacturer => (opcode::SET_NVRAM, Some(nvram::USB_MANUFACTURER)),
            SendPassword => (opcode::SEND_PASSWORD, None),
            RequestBusRelease => (opcode::REQUEST_BUS_RELEASE, None),
        }
    }

    #[inline]
    pub fn opcode(self) -> u8 {
        self.codes().0
    }

    /// The response layout statically paired with this command.
    pub fn response_shape(self) -> ResponseShape {
        use CommandKind::*;
        match self {
            GetChipStatus | CancelTransfer => ResponseShape::ChipStatus,
            GetInterruptCount => ResponseShape::InterruptCount,
            GetChipSettings | GetBootChipSettings => ResponseShape::ChipSettings,
            GetGpioValue | GetGpioDirection | SetGpioValue => ResponseShape::GpioWord,
            GetSpiSettings | GetBootSpiSettings => ResponseShape::SpiSettings,
            SpiTransfer => ResponseShape::SpiTransfer,
            ReadEeprom => ResponseShape::EepromByte,
            GetBootUsbSettings => ResponseShape::UsbSettings,
            GetUsbProduct | GetUsbManufacturer => ResponseShape::UsbString,
            SetChipSettings | SetGpioDirection | SetSpiSettings | WriteEeprom
            | SetBootSpiSettings | SetBootChipSettings | SetBootUsbSettings | SetUsbProduct
            | SetUsbManufacturer | SendPassword | RequestBusRelease => ResponseShape::Status,
        }
    }

    /// Looks a kind up by the first two bytes of a request frame.
    pub fn from_codes(opcode_byte: u8, sub: u8) -> Option<Self> {
        use CommandKind::*;
        let kind = match opcode_byte {
            opcode::GET_CHIP_STATUS => GetChipStatus,
            opcode::CANCEL_TRANSFER => CancelTransfer,
            opcode::GET_INTERRUPT_COUNT => GetInterruptCount,
            opcode::GET_CHIP_SETTINGS => GetChipSettings,
            opcode::SET_CHIP_SETTINGS => SetChipSettings,
            opcode::SET_GPIO_VALUE => SetGpioValue,
            opcode::GET_GPIO_VALUE => GetGpioValue,
            opcode::SET_GPIO_DIRECTION => SetGpioDirection,
            opcode::GET_GPIO_DIRECTION => GetGpioDirection,
            opcode::SET_SPI_SETTINGS => SetSpiSettings,
            opcode::GET_SPI_SETTINGS => GetSpiSettings,
            opcode::SPI_TRANSFER => SpiTransfer,
            opcode::READ_EEPROM => ReadEeprom,
            opcode::WRITE_EEPROM => WriteEeprom,
            opcode::SEND_PASSWORD => SendPassword,
            opcode::REQUEST_BUS_RELEASE => RequestBusRelease,
            opcode::GET_NVRAM => match sub {
                nvram::SPI_SETTINGS => GetBootSpiSettings,
                nvram::CHIP_SETTINGS => GetBootChipSettings,
                nvram::USB_KEY_PARAMS => GetBootUsbSettings,
                nvram::USB_PRODUCT => GetUsbProduct,
                nvram::USB_MANUFACTURER => GetUsbManufacturer,
                _ => return None,
            },
            opcode::SET_NVRAM => match sub {
                nvram::SPI_SETTINGS => SetBootSpiSettings,
                nvram::CHIP_SETTINGS => SetBootChipSettings,
                nvram::USB_KEY_PARAMS => SetBootUsbSettings,
                nvram::USB_PRODUCT => SetUsbProduct,
                nvram::USB_MANUFACTURER => SetUsbManufacturer,
                _ => return None,
            },
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const SETTINGS_OFFSET: usize = 4;
const BOOT_PASSWORD_OFFSET: usize = 19;
const GPIO_WORD_OFFSET: usize = 4;
const PASSWORD_OFFSET: usize = 4;

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::GetChipStatus => CommandKind::GetChipStatus,
            Command::CancelTransfer => CommandKind::CancelTransfer,
            Command::GetInterruptCount { .. } => CommandKind::GetInterruptCount,
            Command::GetChipSettings => CommandKind::GetChipSettings,
            Command::SetChipSettings(_) => CommandKind::SetChipSettings,
            Command::SetGpioValue(_) => CommandKind::SetGpioValue,
            Command::GetGpioValue => CommandKind::GetGpioValue,
            Command::SetGpioDirection(_) => CommandKind::SetGpioDirection,
            Command::GetGpioDirection => CommandKind::GetGpioDirection,
            Command::SetSpiSettings(_) => CommandKind::SetSpiSettings,
            Command::GetSpiSettings => CommandKind::GetSpiSettings,
            Command::SpiTransfer(_) => CommandKind::SpiTransfer,
            Command::ReadEeprom { .. } => CommandKind::ReadEeprom,
            Command::WriteEeprom { .. } => CommandKind::WriteEeprom,
            Command::GetBootSpiSettings => CommandKind::GetBootSpiSettings,
            Command::SetBootSpiSettings(_) => CommandKind::SetBootSpiSettings,
            Command::GetBootChipSettings => CommandKind::GetBootChipSettings,
            Command::SetBootChipSettings { .. } => CommandKind::SetBootChipSettings,
            Command::GetBootUsbSettings => CommandKind::GetBootUsbSettings,
            Command::SetBootUsbSettings(_) => CommandKind::SetBootUsbSettings,
            Command::GetUsbProduct => CommandKind::GetUsbProduct,
            Command::SetUsbProduct(_) => CommandKind::SetUsbProduct,
            Command::GetUsbManufacturer => CommandKind::GetUsbManufacturer,
            Command::SetUsbManufacturer(_) => CommandKind::SetUsbManufacturer,
            Command::SendPassword(_) => CommandKind::SendPassword,
            Command::RequestBusRelease { .. } => CommandKind::RequestBusRelease,
        }
    }

    /// Serializes the command into a zero-padded 64-byte report.
    pub fn encode(&self) -> Report {
        let (opcode, sub) = self.kind().codes();
        let mut report = Report::new(opcode);
        if let Some(sub) = sub {
            report.set_byte(1, sub);
        }
        match self {
            Command::GetInterruptCount { reset } => {
                report.set_byte(1, if *reset { 0x00 } else { 0xFF });
            }
            Command::SetChipSettings(settings) => settings.write_to(&mut report, SETTINGS_OFFSET),
            Command::SetGpioValue(word) | Command::SetGpioDirection(word) => {
                report.set_u16(GPIO_WORD_OFFSET, *word)
            }
            Command::SetSpiSettings(settings) | Command::SetBootSpiSettings(settings) => {
                settings.write_to(&mut report, SETTINGS_OFFSET)
            }
            Command::SpiTransfer(chunk) => {
                report.set_byte(1, chunk.len() as u8);
                report.set_bytes(spi::DATA_OFFSET, chunk.as_slice());
            }
            Command::ReadEeprom { address } => report.set_byte(1, *address),
            Command::WriteEeprom { address, value } => {
                report.set_byte(1, *address);
                report.set_byte(2, *value);
            }
            Command::SetBootChipSettings {
                settings,
                new_password,
            } => {
                settings.write_to(&mut report, SETTINGS_OFFSET);
                if let Some(password) = new_password {
                    report.set_bytes(BOOT_PASSWORD_OFFSET, password.as_bytes());
                }
            }
            Command::SetBootUsbSettings(usb) => {
                report.set_u16(4, usb.vid);
                report.set_u16(6, usb.pid);
                report.set_byte(8, usb.power_attributes);
                report.set_byte(9, usb.current_units);
            }
            Command::SetUsbProduct(name) | Command::SetUsbManufacturer(name) => {
                name.write_to(&mut report)
            }
            Command::SendPassword(password) => {
                report.set_bytes(PASSWORD_OFFSET, password.as_bytes())
            }
            Command::RequestBusRelease { ack } => report.set_byte(1, u8::from(*ack)),
            Command::GetChipStatus
            | Command::CancelTransfer
            | Command::GetChipSettings
            | Command::GetGpioValue
            | Command::GetGpioDirection
            | Command::GetSpiSettings
            | Command::GetBootSpiSettings
            | Command::GetBootChipSettings
            | Command::GetBootUsbSettings
            | Command::GetUsbProduct
            | Command::GetUsbManufacturer => {}
        }
        report
    }

    /// Parses a request frame. Short frames are treated as zero padded.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let report = Report::from_slice(frame).ok_or(Error::OperationTooLarge {
            max: crate::consts::REPORT_SIZE,
            actual: frame.len(),
        })?;
        let bytes = report.as_ref();
        let kind = CommandKind::from_codes(bytes[0], bytes[1]).ok_or(Error::UnknownCommand {
            opcode: bytes[0],
            sub: bytes[1],
        })?;
        let command = match kind {
            CommandKind::GetChipStatus => Command::GetChipStatus,
            CommandKind::CancelTransfer => Command::CancelTransfer,
            CommandKind::GetInterruptCount => Command::GetInterruptCount {
                reset: bytes[1] == 0x00,
            },
            CommandKind::GetChipSettings => Command::GetChipSettings,
            CommandKind::SetChipSettings => {
                Command::SetChipSettings(ChipSettings::read_from(bytes, SETTINGS_OFFSET))
            }
            CommandKind::SetGpioValue => Command::SetGpioValue(read_u16(bytes, GPIO_WORD_OFFSET)),
            CommandKind::GetGpioValue => Command::GetGpioValue,
            CommandKind::SetGpioDirection => {
                Command::SetGpioDirection(read_u16(bytes, GPIO_WORD_OFFSET))
            }
            CommandKind::GetGpioDirection => Command::GetGpioDirection,
            CommandKind::SetSpiSettings => {
                Command::SetSpiSettings(SpiSettings::read_from(bytes, SETTINGS_OFFSET))
            }
            CommandKind::GetSpiSettings => Command::GetSpiSettings,
            CommandKind::SpiTransfer => {
                let len = usize::from(bytes[1]);
                if len > spi::MAX_CHUNK {
                    return Err(malformed(
                        kind,
                        format!("payload length {} exceeds {}", len, spi::MAX_CHUNK),
                    ));
                }
                Command::SpiTransfer(SpiChunk::new(
                    &bytes[spi::DATA_OFFSET..spi::DATA_OFFSET + len],
                )?)
            }
            CommandKind::ReadEeprom => Command::ReadEeprom { address: bytes[1] },
            CommandKind::WriteEeprom => Command::WriteEeprom {
                address: bytes[1],
                value: bytes[2],
            },
            CommandKind::GetBootSpiSettings => Command::GetBootSpiSettings,
            CommandKind::SetBootSpiSettings => {
                Command::SetBootSpiSettings(SpiSettings::read_from(bytes, SETTINGS_OFFSET))
            }
            CommandKind::GetBootChipSettings => Command::GetBootChipSettings,
            CommandKind::SetBootChipSettings => {
                let mut password = [0u8; PASSWORD_LEN];
                password.copy_from_slice(
                    &bytes[BOOT_PASSWORD_OFFSET..BOOT_PASSWORD_OFFSET + PASSWORD_LEN],
                );
                Command::SetBootChipSettings {
                    settings: ChipSettings::read_from(bytes, SETTINGS_OFFSET),
                    new_password: password
                        .iter()
                        .any(|&b| b != 0)
                        .then(|| Password::from_bytes(password)),
                }
            }
            CommandKind::GetBootUsbSettings => Command::GetBootUsbSettings,
            CommandKind::SetBootUsbSettings => Command::SetBootUsbSettings(UsbSettings {
                vid: read_u16(bytes, 4),
                pid: read_u16(bytes, 6),
                power_attributes: bytes[8],
                current_units: bytes[9],
            }),
            CommandKind::GetUsbProduct => Command::GetUsbProduct,
            CommandKind::SetUsbProduct => Command::SetUsbProduct(decode_string(kind, bytes)?),
            CommandKind::GetUsbManufacturer => Command::GetUsbManufacturer,
            CommandKind::SetUsbManufacturer => {
                Command::SetUsbManufacturer(decode_string(kind, bytes)?)
            }
            CommandKind::SendPassword => {
                let mut password = [0u8; PASSWORD_LEN];
                password.copy_from_slice(&bytes[PASSWORD_OFFSET..PASSWORD_OFFSET + PASSWORD_LEN]);
                Command::SendPassword(Password::from_bytes(password))
            }
            CommandKind::RequestBusRelease => Command::RequestBusRelease {
                ack: bytes[1] != 0,
            },
        };
        Ok(command)
    }
}

fn decode_string(kind: CommandKind, bytes: &[u8]) -> Result<DeviceString> {
    DeviceString::read_from(bytes).map_err(|message| malformed(kind, message))
}
