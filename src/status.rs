//! Device status codes and their classification.

use crate::consts::status as code;
use std::fmt;

/// Status byte reported in byte 1 of every response.
///
/// The names follow the meaning the MCP2210 documents for the commands that
/// most commonly report each code; the same value can mean something slightly
/// different for another command. Unlisted values are kept as [`StatusCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Command completed successfully.
    Success,
    /// The SPI bus is owned by an external master.
    SpiBusUnavailable,
    /// An SPI transfer is in progress and the chip cannot accept the request yet.
    TransferInProgress,
    /// The EEPROM write did not complete (e.g. the area is protected).
    EepromWriteFailure,
    /// The chip settings are permanently locked.
    AccessBlocked,
    /// The supplied password was rejected.
    AccessRejected,
    /// Access denied until the chip is power-cycled (too many password attempts).
    AccessDenied,
    /// Any other status value.
    Other(u8),
}

impl StatusCode {
    /// Returns the raw status byte.
    pub fn raw(self) -> u8 {
        match self {
            StatusCode::Success => code::SUCCESS,
            StatusCode::SpiBusUnavailable => code::SPI_BUS_UNAVAILABLE,
            StatusCode::TransferInProgress => code::TRANSFER_IN_PROGRESS,
            StatusCode::EepromWriteFailure => code::EEPROM_WRITE_FAILURE,
            StatusCode::AccessBlocked => code::ACCESS_BLOCKED,
            StatusCode::AccessRejected => code::ACCESS_REJECTED,
            StatusCode::AccessDenied => code::ACCESS_DENIED,
            StatusCode::Other(raw) => raw,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Classifies this code for the SPI transfer loop.
    pub fn classify(self) -> Status {
        match self {
            StatusCode::Success => Status::Success,
            StatusCode::TransferInProgress => Status::Busy,
            other => Status::Error(other),
        }
    }
}

impl From<u8> for StatusCode {
    fn from(raw: u8) -> Self {
        match raw {
            code::SUCCESS => StatusCode::Success,
            code::SPI_BUS_UNAVAILABLE => StatusCode::SpiBusUnavailable,
            code::TRANSFER_IN_PROGRESS => StatusCode::TransferInProgress,
            code::EEPROM_WRITE_FAILURE => StatusCode::EepromWriteFailure,
            code::ACCESS_BLOCKED => StatusCode::AccessBlocked,
            code::ACCESS_REJECTED => StatusCode::AccessRejected,
            code::ACCESS_DENIED => StatusCode::AccessDenied,
            other => StatusCode::Other(other),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Success => "success",
            StatusCode::SpiBusUnavailable => "SPI bus not available",
            StatusCode::TransferInProgress => "SPI transfer in progress",
            StatusCode::EepromWriteFailure => "EEPROM write failure",
            StatusCode::AccessBlocked => "access blocked",
            StatusCode::AccessRejected => "access rejected",
            StatusCode::AccessDenied => "access denied",
            StatusCode::Other(_) => "unknown status",
        };
        write!(f, "{} (0x{:02X})", name, self.raw())
    }
}

/// Outcome of a single exchange as seen by the SPI transfer loop.
///
/// Only SPI transfer responses may be [`Status::Busy`]; every other command
/// treats a non-zero status as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Resend the same request.
    Busy,
    Error(StatusCode),
}

/// Classifies a raw status byte.
pub fn classify(raw: u8) -> Status {
    StatusCode::from(raw).classify()
}
