//! Response side of the codec.
//!
//! A response is decoded against the [`CommandKind`] of the request that
//! produced it: the kind selects the layout through
//! [`CommandKind::response_shape`]. The status byte is always decoded; the body
//! is only decoded when the status is success.

use crate::command::{CommandKind, ResponseShape};
use crate::consts::{opcode, spi};
use crate::error::{malformed, short_report, Error, Result};
use crate::report::{read_u16, Report};
use crate::settings::{ChipSettings, ChipStatus, DeviceString, SpiSettings, UsbSettings};
use crate::status::StatusCode;
use log::trace;

/// State of the SPI engine reported with every SPI transfer response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiEngineStatus {
    /// The transfer is complete.
    Finished,
    /// The transfer started but no data has been received yet.
    StartedNoData,
    /// Received data is waiting to be read.
    DataAvailable,
    Unknown(u8),
}

impl SpiEngineStatus {
    pub fn raw(self) -> u8 {
        match self {
            SpiEngineStatus::Finished => spi::ENGINE_FINISHED,
            SpiEngineStatus::StartedNoData => spi::ENGINE_STARTED_NO_DATA,
            SpiEngineStatus::DataAvailable => spi::ENGINE_DATA_AVAILABLE,
            SpiEngineStatus::Unknown(raw) => raw,
        }
    }

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            spi::ENGINE_FINISHED => SpiEngineStatus::Finished,
            spi::ENGINE_STARTED_NO_DATA => SpiEngineStatus::StartedNoData,
            spi::ENGINE_DATA_AVAILABLE => SpiEngineStatus::DataAvailable,
            other => SpiEngineStatus::Unknown(other),
        }
    }
}

/// Command-specific part of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// No fields beyond the status, or the status was not success.
    Empty,
    ChipStatus(ChipStatus),
    InterruptCount(u16),
    ChipSettings(ChipSettings),
    Gpio(u16),
    SpiSettings(SpiSettings),
    SpiTransfer {
        data: Vec<u8>,
        engine: SpiEngineStatus,
    },
    Eeprom {
        address: u8,
        value: u8,
    },
    UsbSettings(UsbSettings),
    UsbString(DeviceString),
}

/// A decoded response report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The command this response answers.
    pub command: CommandKind,
    /// Status byte at offset 1.
    pub status: StatusCode,
    /// Decoded payload; [`ResponseBody::Empty`] unless the status is success.
    pub body: ResponseBody,
}

const SETTINGS_OFFSET: usize = 4;
const NVRAM_SUB_ECHO_OFFSET: usize = 2;
// Get NVRAM (USB key parameters) places its fields differently from the Set layout.
const USB_VID_OFFSET: usize = 12;
const USB_PID_OFFSET: usize = 14;
const USB_POWER_OFFSET: usize = 29;
const USB_CURRENT_OFFSET: usize = 30;

impl Response {
    /// Decodes `frame` as the response to a `command` request.
    pub fn decode(command: CommandKind, frame: &[u8]) -> Result<Self> {
        let shape = command.response_shape();
        if frame.len() < shape.min_len() {
            return Err(short_report(command, shape.min_len(), frame.len()));
        }
        if frame[0] != command.opcode() {
            return Err(Error::UnexpectedOpcode {
                expected: command.opcode(),
                actual: frame[0],
            });
        }
        let status = StatusCode::from(frame[1]);
        if !status.is_success() {
            trace!("{} answered with status {}", command, status);
            return Ok(Response {
                command,
                status,
                body: ResponseBody::Empty,
            });
        }
        if let (opcode::GET_NVRAM, Some(sub)) = command.codes() {
            if frame[NVRAM_SUB_ECHO_OFFSET] != sub {
                return Err(malformed(
                    command,
                    format!(
                        "sub-command echo 0x{:02X} (expected 0x{:02X})",
                        frame[NVRAM_SUB_ECHO_OFFSET], sub
                    ),
                ));
            }
        }

        let body = match shape {
            ResponseShape::Status => ResponseBody::Empty,
            ResponseShape::ChipStatus => ResponseBody::ChipStatus(ChipStatus::read_from(frame)),
            ResponseShape::InterruptCount => ResponseBody::InterruptCount(read_u16(frame, 4)),
            ResponseShape::ChipSettings => {
                ResponseBody::ChipSettings(ChipSettings::read_from(frame, SETTINGS_OFFSET))
            }
            ResponseShape::GpioWord => ResponseBody::Gpio(read_u16(frame, 4)),
            ResponseShape::SpiSettings => {
                ResponseBody::SpiSettings(SpiSettings::read_from(frame, SETTINGS_OFFSET))
            }
            ResponseShape::SpiTransfer => {
                let len = usize::from(frame[2]);
                if len > spi::MAX_CHUNK {
                    return Err(malformed(
                        command,
                        format!("received length {} exceeds {}", len, spi::MAX_CHUNK),
                    ));
                }
                let needed = spi::DATA_OFFSET + len;
                if frame.len() < needed {
                    return Err(short_report(command, needed, frame.len()));
                }
                ResponseBody::SpiTransfer {
                    data: frame[spi::DATA_OFFSET..needed].to_vec(),
                    engine: SpiEngineStatus::from_raw(frame[3]),
                }
            }
            ResponseShape::EepromByte => ResponseBody::Eeprom {
                address: frame[2],
                value: frame[3],
            },
            ResponseShape::UsbSettings => ResponseBody::UsbSettings(UsbSettings {
                vid: read_u16(frame, USB_VID_OFFSET),
                pid: read_u16(frame, USB_PID_OFFSET),
                power_attributes: frame[USB_POWER_OFFSET],
                current_units: frame[USB_CURRENT_OFFSET],
            }),
            ResponseShape::UsbString => {
                let needed = DeviceString::required_len(frame);
                if frame.len() < needed {
                    return Err(short_report(command, needed, frame.len()));
                }
                let string =
                    DeviceString::read_from(frame).map_err(|message| malformed(command, message))?;
                ResponseBody::UsbString(string)
            }
        };
        Ok(Response {
            command,
            status,
            body,
        })
    }

    /// Builds the report a device would send for this response.
    pub fn encode(&self) -> Report {
        let mut report = Report::new(self.command.opcode());
        report.set_byte(1, self.status.raw());
        if let (opcode::GET_NVRAM, Some(sub)) = self.command.codes() {
            report.set_byte(NVRAM_SUB_ECHO_OFFSET, sub);
        }
        match &self.body {
            ResponseBody::Empty => {}
            ResponseBody::ChipStatus(status) => status.write_to(&mut report),
            ResponseBody::InterruptCount(count) => report.set_u16(4, *count),
            ResponseBody::ChipSettings(settings) => settings.write_to(&mut report, SETTINGS_OFFSET),
            ResponseBody::Gpio(word) => report.set_u16(4, *word),
            ResponseBody::SpiSettings(settings) => {
                if self.command == CommandKind::GetSpiSettings {
                    report.set_byte(2, spi::SETTINGS_RECORD_SIZE);
                }
                settings.write_to(&mut report, SETTINGS_OFFSET);
            }
            ResponseBody::SpiTransfer { data, engine } => {
                report.set_byte(2, data.len() as u8);
                report.set_byte(3, engine.raw());
                report.set_bytes(spi::DATA_OFFSET, data);
            }
            ResponseBody::Eeprom { address, value } => {
                report.set_byte(2, *address);
                report.set_byte(3, *value);
            }
            ResponseBody::UsbSettings(usb) => {
                report.set_u16(USB_VID_OFFSET, usb.vid);
                report.set_u16(USB_PID_OFFSET, usb.pid);
                report.set_byte(USB_POWER_OFFSET, usb.power_attributes);
                report.set_byte(USB_CURRENT_OFFSET, usb.current_units);
            }
            ResponseBody::UsbString(string) => string.write_to(&mut report),
        }
        report
    }

    /// Returns the body if the status is success, otherwise the device error.
    pub fn check(self) -> Result<ResponseBody> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(Error::Command {
                command: self.command,
                status: self.status,
            })
        }
    }
}

/// Error for a body that does not match the layout paired with `command`.
pub(crate) fn unexpected_body(command: CommandKind, body: &ResponseBody) -> Error {
    malformed(command, format!("unexpected response body {:?}", body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BusOwner, InterruptMode};

    fn ok(command: CommandKind, body: ResponseBody) -> Response {
        Response {
            command,
            status: StatusCode::Success,
            body,
        }
    }

    #[test]
    fn test_synthetic_responses_decode_to_themselves() {
        let chip = ChipSettings {
            gpio_output: 0x0003,
            interrupt_mode: InterruptMode::RisingEdges,
            ..Default::default()
        };
        let responses = vec![
            ok(
                CommandKind::CancelTransfer,
                ResponseBody::ChipStatus(ChipStatus {
                    bus_release_pending: false,
                    bus_owner: BusOwner::Bridge,
                    password_attempts: 2,
                    password_guessed: true,
                }),
            ),
            ok(CommandKind::GetInterruptCount, ResponseBody::InterruptCount(513)),
            ok(CommandKind::GetChipSettings, ResponseBody::ChipSettings(chip)),
            ok(CommandKind::GetBootChipSettings, ResponseBody::ChipSettings(chip)),
            ok(CommandKind::GetGpioValue, ResponseBody::Gpio(0x01FF)),
            ok(CommandKind::SetGpioValue, ResponseBody::Gpio(0x0001)),
            ok(CommandKind::GetGpioDirection, ResponseBody::Gpio(0x0100)),
            ok(
                CommandKind::GetSpiSettings,
                ResponseBody::SpiSettings(SpiSettings::default()),
            ),
            ok(
                CommandKind::GetBootSpiSettings,
                ResponseBody::SpiSettings(SpiSettings::default()),
            ),
            ok(
                CommandKind::SpiTransfer,
                ResponseBody::SpiTransfer {
                    data: b"HELLO WORLD".to_vec(),
                    engine: SpiEngineStatus::Finished,
                },
            ),
            ok(
                CommandKind::SpiTransfer,
                ResponseBody::SpiTransfer {
                    data: Vec::new(),
                    engine: SpiEngineStatus::StartedNoData,
                },
            ),
            ok(
                CommandKind::ReadEeprom,
                ResponseBody::Eeprom {
                    address: 12,
                    value: 8,
                },
            ),
            ok(
                CommandKind::GetBootUsbSettings,
                ResponseBody::UsbSettings(UsbSettings::default()),
            ),
            ok(
                CommandKind::GetUsbManufacturer,
                ResponseBody::UsbString(DeviceString::new("Microchip Technology Inc.").unwrap()),
            ),
            ok(
                CommandKind::GetUsbProduct,
                ResponseBody::UsbString(DeviceString::new("MCP2210 USB to SPI Master").unwrap()),
            ),
            ok(CommandKind::WriteEeprom, ResponseBody::Empty),
            ok(CommandKind::SendPassword, ResponseBody::Empty),
        ];
        for response in responses {
            let report = response.encode();
            let decoded = Response::decode(response.command, report.as_ref()).unwrap();
            assert_eq!(decoded, response);
        }
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let report = ok(CommandKind::GetSpiSettings, ResponseBody::SpiSettings(SpiSettings::default()))
            .encode();
        let err = Response::decode(CommandKind::GetSpiSettings, &report.as_ref()[..20]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidReport {
                command: CommandKind::GetSpiSettings,
                expected: 21,
                actual: 20
            }
        ));
    }

    #[test]
    fn test_short_spi_payload_is_rejected() {
        let report = ok(
            CommandKind::SpiTransfer,
            ResponseBody::SpiTransfer {
                data: vec![1; 10],
                engine: SpiEngineStatus::DataAvailable,
            },
        )
        .encode();
        assert!(matches!(
            Response::decode(CommandKind::SpiTransfer, &report.as_ref()[..12]),
            Err(Error::InvalidReport { expected: 14, .. })
        ));
    }

    #[test]
    fn test_opcode_echo_is_checked() {
        let report = ok(CommandKind::GetGpioValue, ResponseBody::Gpio(1)).encode();
        assert!(matches!(
            Response::decode(CommandKind::GetGpioDirection, report.as_ref()),
            Err(Error::UnexpectedOpcode {
                expected: 0x33,
                actual: 0x31
            })
        ));
    }

    #[test]
    fn test_nvram_sub_command_echo_is_checked() {
        let report = ok(
            CommandKind::GetUsbProduct,
            ResponseBody::UsbString(DeviceString::new("x").unwrap()),
        )
        .encode();
        assert!(matches!(
            Response::decode(CommandKind::GetUsbManufacturer, report.as_ref()),
            Err(Error::MalformedField { .. })
        ));
    }

    #[test]
    fn test_error_status_skips_body() {
        let mut frame = [0u8; 64];
        frame[0] = 0x42;
        frame[1] = 0xF8;
        frame[2] = 0xFF; // garbage length must not be trusted
        let response = Response::decode(CommandKind::SpiTransfer, &frame).unwrap();
        assert_eq!(response.status, StatusCode::TransferInProgress);
        assert_eq!(response.body, ResponseBody::Empty);
        assert!(matches!(
            response.check(),
            Err(Error::Command {
                command: CommandKind::SpiTransfer,
                status: StatusCode::TransferInProgress
            })
        ));
    }
}
