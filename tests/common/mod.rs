//! Simulated MCP2210 for integration tests.
//!
//! [`SimulatedMcp2210`] implements [`Transport`]: every written report is
//! decoded as a [`Command`], answered from in-memory chip state and the
//! encoded [`Response`] is returned by the next `read()`. Tests can script busy
//! responses, delayed SPI receive data, injected error statuses and raw frames.
#![allow(dead_code)]

use mcp2210_hid::{
    BusOwner, ChipSettings, ChipStatus, Command, CommandKind, Config, DeviceString, Error,
    Mcp2210, Password, Response, ResponseBody, Result, SpiChunk, SpiEngineStatus, SpiSettings,
    StatusCode, Transport, UsbSettings, REPORT_SIZE,
};
use std::collections::{HashMap, VecDeque};

pub const EEPROM_SIZE: usize = 255;

#[derive(Debug)]
pub struct SimulatedMcp2210 {
    // --- Chip state ---
    pub eeprom: [u8; EEPROM_SIZE],
    pub chip: ChipSettings,
    pub boot_chip: ChipSettings,
    pub spi: SpiSettings,
    pub boot_spi: SpiSettings,
    pub usb: UsbSettings,
    pub manufacturer: DeviceString,
    pub product: DeviceString,
    pub gpio_values: u16,
    pub gpio_direction: u16,
    pub interrupt_count: u16,
    pub password: Option<Password>,
    pub password_attempts: u8,
    pub authenticated: bool,

    // --- SPI engine ---
    /// Bytes clocked in but not yet returned.
    pub spi_pending: VecDeque<u8>,
    /// Number of received bytes held back from responses to data-carrying requests.
    pub spi_rx_lag: usize,
    /// Busy responses to give before accepting each successive SPI request.
    pub spi_busy_script: VecDeque<u32>,
    busy_remaining: Option<u32>,
    /// Every SPI request is answered busy.
    pub spi_always_busy: bool,
    /// Drain requests succeed but never return data.
    pub spi_stall_drain: bool,
    /// Extra bytes appended to the first drain response.
    pub spi_excess: Vec<u8>,

    // --- Fault injection ---
    /// Status returned for every request of the given kind.
    pub fail_status: HashMap<CommandKind, u8>,
    /// EEPROM write to this address fails with 0xFA.
    pub fail_eeprom_write_at: Option<u8>,
    /// Raw frames returned instead of the simulated responses, in order.
    pub raw_responses: VecDeque<Vec<u8>>,

    // --- Observation ---
    pub sent: Vec<Command>,
    pub raw_sent: Vec<Vec<u8>>,
    pending: Option<Vec<u8>>,
}

impl Default for SimulatedMcp2210 {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedMcp2210 {
    pub fn new() -> Self {
        SimulatedMcp2210 {
            eeprom: [0xFF; EEPROM_SIZE],
            chip: ChipSettings::default(),
            boot_chip: ChipSettings::default(),
            spi: SpiSettings::default(),
            boot_spi: SpiSettings::default(),
            usb: UsbSettings::default(),
            manufacturer: DeviceString::new("Microchip Technology Inc.").unwrap(),
            product: DeviceString::new("MCP2210 USB to SPI Master").unwrap(),
            gpio_values: 0,
            gpio_direction: 0x01FF,
            interrupt_count: 0,
            password: None,
            password_attempts: 0,
            authenticated: false,
            spi_pending: VecDeque::new(),
            spi_rx_lag: 0,
            spi_busy_script: VecDeque::new(),
            busy_remaining: None,
            spi_always_busy: false,
            spi_stall_drain: false,
            spi_excess: Vec::new(),
            fail_status: HashMap::new(),
            fail_eeprom_write_at: None,
            raw_responses: VecDeque::new(),
            sent: Vec::new(),
            raw_sent: Vec::new(),
            pending: None,
        }
    }

    /// Kinds of all commands received so far.
    pub fn sent_kinds(&self) -> Vec<CommandKind> {
        self.sent.iter().map(Command::kind).collect()
    }

    /// Number of commands of `kind` received so far.
    pub fn count(&self, kind: CommandKind) -> usize {
        self.sent.iter().filter(|c| c.kind() == kind).count()
    }

    /// Payloads of all SPI transfer requests, in order.
    pub fn spi_requests(&self) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter_map(|c| match c {
                Command::SpiTransfer(chunk) => Some(chunk.as_slice().to_vec()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.sent.clear();
        self.raw_sent.clear();
    }

    fn status(&self) -> ChipStatus {
        ChipStatus {
            bus_release_pending: false,
            bus_owner: BusOwner::None,
            password_attempts: self.password_attempts,
            password_guessed: self.authenticated,
        }
    }

    fn respond(&mut self, command: &Command) -> Response {
        let kind = command.kind();
        if let Some(&raw) = self.fail_status.get(&kind) {
            return Response {
                command: kind,
                status: StatusCode::from(raw),
                body: ResponseBody::Empty,
            };
        }
        let mut status = StatusCode::Success;
        let body = match command {
            Command::GetChipStatus => ResponseBody::ChipStatus(self.status()),
            Command::CancelTransfer => {
                self.spi_pending.clear();
                self.busy_remaining = None;
                ResponseBody::ChipStatus(self.status())
            }
            Command::GetInterruptCount { reset } => {
                let count = self.interrupt_count;
                if *reset {
                    self.interrupt_count = 0;
                }
                ResponseBody::InterruptCount(count)
            }
            Command::GetChipSettings => ResponseBody::ChipSettings(self.chip),
            Command::SetChipSettings(settings) => {
                self.chip = *settings;
                self.gpio_values = settings.gpio_output;
                self.gpio_direction = settings.gpio_direction;
                ResponseBody::Empty
            }
            Command::SetGpioValue(word) => {
                self.gpio_values = *word;
                ResponseBody::Gpio(*word)
            }
            Command::GetGpioValue => ResponseBody::Gpio(self.gpio_values),
            Command::SetGpioDirection(word) => {
                self.gpio_direction = *word;
                ResponseBody::Empty
            }
            Command::GetGpioDirection => ResponseBody::Gpio(self.gpio_direction),
            Command::SetSpiSettings(settings) => {
                self.spi = *settings;
                ResponseBody::Empty
            }
            Command::GetSpiSettings => ResponseBody::SpiSettings(self.spi),
            Command::SpiTransfer(chunk) => return self.spi_transfer(chunk),
            Command::ReadEeprom { address } => ResponseBody::Eeprom {
                address: *address,
                value: self.eeprom[usize::from(*address)],
            },
            Command::WriteEeprom { address, value } => {
                if self.fail_eeprom_write_at == Some(*address) {
                    status = StatusCode::EepromWriteFailure;
                } else {
                    self.eeprom[usize::from(*address)] = *value;
                }
                ResponseBody::Empty
            }
            Command::GetBootSpiSettings => ResponseBody::SpiSettings(self.boot_spi),
            Command::SetBootSpiSettings(settings) => {
                self.boot_spi = *settings;
                ResponseBody::Empty
            }
            Command::GetBootChipSettings => ResponseBody::ChipSettings(self.boot_chip),
            Command::SetBootChipSettings {
                settings,
                new_password,
            } => {
                self.boot_chip = *settings;
                if new_password.is_some() {
                    self.password = *new_password;
                }
                ResponseBody::Empty
            }
            Command::GetBootUsbSettings => ResponseBody::UsbSettings(self.usb),
            Command::SetBootUsbSettings(usb) => {
                self.usb = *usb;
                ResponseBody::Empty
            }
            Command::GetUsbProduct => ResponseBody::UsbString(self.product.clone()),
            Command::SetUsbProduct(name) => {
                self.product = name.clone();
                ResponseBody::Empty
            }
            Command::GetUsbManufacturer => ResponseBody::UsbString(self.manufacturer.clone()),
            Command::SetUsbManufacturer(name) => {
                self.manufacturer = name.clone();
                ResponseBody::Empty
            }
            Command::SendPassword(password) => {
                if self.password.is_none() || self.password == Some(*password) {
                    self.authenticated = true;
                } else {
                    self.password_attempts += 1;
                    status = StatusCode::AccessRejected;
                }
                ResponseBody::Empty
            }
            Command::RequestBusRelease { .. } => ResponseBody::Empty,
        };
        let body = if status.is_success() {
            body
        } else {
            ResponseBody::Empty
        };
        Response {
            command: kind,
            status,
            body,
        }
    }

    fn spi_transfer(&mut self, chunk: &SpiChunk) -> Response {
        let busy = |command| Response {
            command,
            status: StatusCode::TransferInProgress,
            body: ResponseBody::Empty,
        };
        if self.spi_always_busy {
            return busy(CommandKind::SpiTransfer);
        }
        let remaining = match self.busy_remaining {
            Some(n) => n,
            None => self.spi_busy_script.pop_front().unwrap_or(0),
        };
        if remaining > 0 {
            self.busy_remaining = Some(remaining - 1);
            return busy(CommandKind::SpiTransfer);
        }
        self.busy_remaining = None;

        // Loopback: the bytes clocked out are the bytes clocked in.
        self.spi_pending.extend(chunk.as_slice());
        let available = if chunk.is_empty() {
            if self.spi_stall_drain {
                0
            } else {
                self.spi_pending.len()
            }
        } else {
            self.spi_pending.len().saturating_sub(self.spi_rx_lag)
        };
        let take = available.min(60);
        let mut data: Vec<u8> = self.spi_pending.drain(..take).collect();
        if chunk.is_empty() && !self.spi_excess.is_empty() && data.len() + self.spi_excess.len() <= 60
        {
            data.append(&mut self.spi_excess);
        }
        let engine = if self.spi_pending.is_empty() {
            SpiEngineStatus::Finished
        } else {
            SpiEngineStatus::DataAvailable
        };
        Response {
            command: CommandKind::SpiTransfer,
            status: StatusCode::Success,
            body: ResponseBody::SpiTransfer { data, engine },
        }
    }
}

impl Transport for SimulatedMcp2210 {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), REPORT_SIZE, "requests are full reports");
        self.raw_sent.push(data.to_vec());
        let command = Command::decode(data)?;
        let response = self.respond(&command);
        self.sent.push(command);
        let frame = match self.raw_responses.pop_front() {
            Some(raw) => raw,
            None => response.encode().as_ref().to_vec(),
        };
        self.pending = Some(frame);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let frame = self.pending.take().ok_or(Error::Timeout)?;
        buf[..frame.len()].copy_from_slice(&frame);
        Ok(frame.len())
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Opens a session on `sim` and clears the construction traffic from its log.
pub fn open(sim: SimulatedMcp2210) -> Mcp2210<SimulatedMcp2210> {
    open_with_config(sim, Config::default())
}

pub fn open_with_config(sim: SimulatedMcp2210, config: Config) -> Mcp2210<SimulatedMcp2210> {
    init_logger();
    let mut device = Mcp2210::with_config(sim, config).expect("session should open");
    device.transport_mut().clear_log();
    device
}
