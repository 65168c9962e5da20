//! Session configuration.

use crate::transport::Framing;
use std::time::Duration;

/// Default read timeout for one response report.
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 1000;
/// Default number of resends of a busy SPI transfer request.
pub const DEFAULT_MAX_BUSY_RETRIES: u32 = 10_000;

/// Bounds on the SPI busy-retry loop.
///
/// Each SPI request may be answered busy up to `max_busy_retries` times, and
/// the drain loop may receive that many empty answers in a row. The transfer
/// gives up with [`Error::BusyTimeout`](crate::Error::BusyTimeout) once either
/// bound is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Busy answers tolerated for one request before giving up.
    pub max_busy_retries: u32,
    /// Wall-clock limit for one whole transfer, checked between retries.
    pub busy_deadline: Option<Duration>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            max_busy_retries: DEFAULT_MAX_BUSY_RETRIES,
            busy_deadline: None,
        }
    }
}

/// Options for opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Outgoing frame layout. Only used by constructors that open a HID device.
    pub framing: Framing,
    /// Read timeout in milliseconds, `-1` blocks. Only used by HID constructors.
    pub read_timeout_ms: i32,
    /// Busy-retry bounds for SPI transfers.
    pub transfer: TransferConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            framing: Framing::default(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            transfer: TransferConfig::default(),
        }
    }
}

impl Config {
    pub fn with_pad_byte(mut self, prepend_pad_byte: bool) -> Self {
        self.framing.prepend_pad_byte = prepend_pad_byte;
        self
    }

    pub fn with_read_timeout_ms(mut self, timeout_ms: i32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_busy_retries(mut self, retries: u32) -> Self {
        self.transfer.max_busy_retries = retries;
        self
    }

    pub fn with_busy_deadline(mut self, deadline: Duration) -> Self {
        self.transfer.busy_deadline = Some(deadline);
        self
    }
}
