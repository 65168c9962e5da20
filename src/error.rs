use crate::command::CommandKind;
use crate::status::StatusCode;
use thiserror::Error;

/// Errors that can occur when using an MCP2210.
///
/// The variants fall into four groups: transport failures (`Hid`, `Io`,
/// `Timeout`), framing failures (`InvalidReport`, `UnexpectedOpcode`,
/// `MalformedField`), device-reported failures (`Command`) and the busy-retry
/// ceiling (`BusyTimeout`). The remaining variants reject bad arguments before
/// anything is sent.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying HID API layer.
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// No MCP2210 was found with the specified vendor/product ID.
    #[error("Device not found with specified VID/PID")]
    DeviceNotFound,
    /// The device at the given path could not be opened.
    #[error("Device not found at path '{path}': {message}")]
    DeviceNotFoundByPath {
        /// The device path that was opened.
        path: String,
        /// Additional error details.
        message: String,
    },
    /// General I/O error during device communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// No response report arrived within the transport read timeout.
    #[error("Timeout waiting for device response")]
    Timeout,
    /// A response report was shorter than the layout of its command requires.
    #[error("Invalid report for {command}: expected at least {expected} bytes, got {actual}")]
    InvalidReport {
        /// The command whose response was being decoded.
        command: CommandKind,
        /// Minimum length of the response layout.
        expected: usize,
        /// Number of bytes actually received.
        actual: usize,
    },
    /// The response did not echo the opcode of the request.
    #[error("Unexpected response opcode 0x{actual:02X} (expected 0x{expected:02X})")]
    UnexpectedOpcode {
        /// Opcode of the request.
        expected: u8,
        /// Opcode found in byte 0 of the response.
        actual: u8,
    },
    /// A field inside an otherwise well-sized report could not be decoded.
    #[error("Malformed {command} report: {message}")]
    MalformedField {
        /// The command whose report was being decoded.
        command: CommandKind,
        /// What was wrong with the field.
        message: String,
    },
    /// A request frame carried an opcode (or NVRAM sub-command) this crate does not know.
    #[error("Unknown command code 0x{opcode:02X} (sub-command 0x{sub:02X})")]
    UnknownCommand {
        /// Byte 0 of the frame.
        opcode: u8,
        /// Byte 1 of the frame.
        sub: u8,
    },
    /// The device answered with a non-success status.
    #[error("{command} failed with device status {status}")]
    Command {
        /// The command that was rejected.
        command: CommandKind,
        /// Status code reported by the device.
        status: StatusCode,
    },
    /// The SPI engine stayed busy past the configured retry ceiling or deadline.
    #[error("SPI transfer still busy after {retries} retries")]
    BusyTimeout {
        /// Number of resends issued before giving up.
        retries: u32,
    },
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// GPIO pin number is outside the valid range for this device.
    #[error("GPIO pin {pin} argument out of range (0-8): {message}")]
    PinArgumentOutOfRange {
        /// The invalid pin number that was specified.
        pin: u8,
        /// Detailed error message explaining the constraint.
        message: String,
    },
    /// Requested operation exceeds device or protocol limits.
    #[error("Requested operation size is too large (max {max}, got {actual})")]
    OperationTooLarge {
        /// Maximum allowed size for this operation.
        max: usize,
        /// Actual size requested.
        actual: usize,
    },
    /// A multi-byte EEPROM write failed part way. Bytes already written stay written.
    #[error("EEPROM write failed at address {address} after {completed} bytes: {source}")]
    PartialWrite {
        /// Number of bytes written successfully before the failure.
        completed: usize,
        /// Address of the byte whose write failed.
        address: u8,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for MCP2210 operations.
///
/// This is a convenience alias for `std::result::Result<T, Error>` used
/// throughout the crate to reduce boilerplate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the device status code if this error was reported by the chip.
    pub fn device_status(&self) -> Option<StatusCode> {
        match self {
            Error::Command { status, .. } => Some(*status),
            Error::PartialWrite { source, .. } => source.device_status(),
            _ => None,
        }
    }
}

pub(crate) fn short_report(command: CommandKind, expected: usize, actual: usize) -> Error {
    Error::InvalidReport {
        command,
        expected,
        actual,
    }
}

pub(crate) fn malformed(command: CommandKind, message: impl Into<String>) -> Error {
    Error::MalformedField {
        command,
        message: message.into(),
    }
}
