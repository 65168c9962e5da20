//! SPI transfers.
//!
//! A transfer first programs the transaction size into the current SPI
//! settings, then sends the payload in 60-byte reports. The chip answers
//! "transfer in progress" while its engine is busy; such a report is resent
//! unchanged. Once every chunk has been accepted, empty reports drain the
//! remaining receive data until as many bytes came back as were sent.

use crate::command::{Command, CommandKind, SpiChunk};
use crate::config::TransferConfig;
use crate::consts::spi::MAX_CHUNK;
use crate::device::Mcp2210;
use crate::error::{Error, Result};
use crate::response::{unexpected_body, ResponseBody};
use crate::status::Status;
use crate::transport::Transport;
use log::{debug, trace, warn};
use std::time::Instant;

/// Largest transfer the 16-bit transaction size field can describe.
pub const MAX_TRANSFER_LEN: usize = u16::MAX as usize;

/// Bounds on busy retries.
///
/// The retry ceiling applies to each request on its own: a chunk may be
/// answered busy up to `max_retries` times before it is accepted, and the
/// drain loop may see that many empty answers in a row. The deadline covers
/// the whole transfer.
struct BusyBudget {
    max_retries: u32,
    deadline: Option<Instant>,
}

impl BusyBudget {
    fn new(config: &TransferConfig) -> Self {
        BusyBudget {
            max_retries: config.max_busy_retries,
            deadline: config.busy_deadline.map(|d| Instant::now() + d),
        }
    }

    /// Counts one more retry in `retries`, or fails once a bound is hit.
    fn spend(&self, retries: &mut u32) -> Result<()> {
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        if *retries >= self.max_retries || expired {
            warn!("SPI engine still busy after {} retries", retries);
            return Err(Error::BusyTimeout { retries: *retries });
        }
        *retries += 1;
        Ok(())
    }
}

impl<T: Transport> Mcp2210<T> {
    /// Clocks `data` out on the SPI bus and returns the bytes clocked in.
    ///
    /// The result is exactly `data.len()` bytes long. Chip select and timing
    /// come from the current SPI settings; only their transaction size is
    /// changed.
    pub fn spi_transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() > MAX_TRANSFER_LEN {
            return Err(Error::OperationTooLarge {
                max: MAX_TRANSFER_LEN,
                actual: data.len(),
            });
        }
        let mut settings = self.spi_settings()?;
        settings.bytes_per_transaction = data.len() as u16;
        self.set_spi_settings(settings)?;

        debug!("SPI transfer of {} bytes", data.len());
        let budget = BusyBudget::new(&self.config.transfer);
        let mut received = Vec::with_capacity(data.len());

        for chunk in data.chunks(MAX_CHUNK) {
            let rx = self.spi_transfer_chunk(SpiChunk::new(chunk)?, &budget)?;
            received.extend_from_slice(&rx);
        }

        let mut stalled = 0;
        while received.len() < data.len() {
            let rx = self.spi_transfer_chunk(SpiChunk::empty(), &budget)?;
            if rx.is_empty() {
                budget.spend(&mut stalled)?;
            } else {
                stalled = 0;
            }
            received.extend_from_slice(&rx);
        }

        if received.len() > data.len() {
            warn!(
                "SPI transfer returned {} bytes for {} sent, truncating",
                received.len(),
                data.len()
            );
            received.truncate(data.len());
        }
        Ok(received)
    }

    /// Sends one chunk, resending it while the chip reports busy.
    fn spi_transfer_chunk(&mut self, chunk: SpiChunk, budget: &BusyBudget) -> Result<Vec<u8>> {
        let command = Command::SpiTransfer(chunk);
        let mut retries = 0;
        loop {
            let response = self.link.exchange(&command)?;
            match response.status.classify() {
                Status::Success => {
                    return match response.body {
                        ResponseBody::SpiTransfer { data, engine } => {
                            trace!("SPI chunk: {} bytes back, engine {:?}", data.len(), engine);
                            Ok(data)
                        }
                        other => Err(unexpected_body(CommandKind::SpiTransfer, &other)),
                    };
                }
                Status::Busy => budget.spend(&mut retries)?,
                Status::Error(status) => {
                    return Err(Error::Command {
                        command: CommandKind::SpiTransfer,
                        status,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_budget_allows_exactly_max_retries() {
        let budget = BusyBudget::new(&TransferConfig {
            max_busy_retries: 2,
            busy_deadline: None,
        });
        let mut retries = 0;
        assert!(budget.spend(&mut retries).is_ok());
        assert!(budget.spend(&mut retries).is_ok());
        assert!(matches!(
            budget.spend(&mut retries),
            Err(Error::BusyTimeout { retries: 2 })
        ));
        // A fresh counter starts over.
        let mut next = 0;
        assert!(budget.spend(&mut next).is_ok());
    }

    #[test]
    fn test_budget_deadline() {
        let budget = BusyBudget::new(&TransferConfig {
            max_busy_retries: u32::MAX,
            busy_deadline: Some(Duration::ZERO),
        });
        assert!(matches!(
            budget.spend(&mut 0),
            Err(Error::BusyTimeout { retries: 0 })
        ));
    }
}
