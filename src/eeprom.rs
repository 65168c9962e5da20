//! User EEPROM access.
//!
//! The chip exposes 255 bytes of user EEPROM at addresses 0-254. Every byte is
//! one request/response exchange.

use crate::command::{Command, CommandKind};
use crate::consts::eeprom::SIZE;
use crate::device::Mcp2210;
use crate::error::{malformed, Error, Result};
use crate::response::{unexpected_body, ResponseBody};
use crate::transport::Transport;
use log::{debug, trace};
use std::ops::{Bound, Range, RangeBounds};

/// Borrowed view of the EEPROM of an open session.
#[derive(Debug)]
pub struct Eeprom<'a, T: Transport> {
    device: &'a mut Mcp2210<T>,
}

impl<T: Transport> Mcp2210<T> {
    /// EEPROM accessor.
    pub fn eeprom(&mut self) -> Eeprom<'_, T> {
        Eeprom { device: self }
    }
}

fn check_address(address: u8) -> Result<()> {
    if usize::from(address) < SIZE {
        Ok(())
    } else {
        Err(Error::ArgumentOutOfRange(format!(
            "EEPROM address {} out of range (0-{})",
            address,
            SIZE - 1
        )))
    }
}

/// Resolves `range` to `[start, end)` clamped to the EEPROM size.
fn clamp_range(range: impl RangeBounds<u8>) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&s) => usize::from(s),
        Bound::Excluded(&s) => usize::from(s) + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => usize::from(e) + 1,
        Bound::Excluded(&e) => usize::from(e),
        Bound::Unbounded => SIZE,
    };
    let end = end.min(SIZE);
    start.min(end)..end
}

impl<T: Transport> Eeprom<'_, T> {
    /// Reads the byte at `address`.
    pub fn read(&mut self, address: u8) -> Result<u8> {
        check_address(address)?;
        let command = Command::ReadEeprom { address };
        match self.device.send_command(&command)? {
            ResponseBody::Eeprom {
                address: echoed,
                value,
            } => {
                if echoed != address {
                    return Err(malformed(
                        CommandKind::ReadEeprom,
                        format!("address echo {} (expected {})", echoed, address),
                    ));
                }
                trace!("EEPROM[{}] = 0x{:02X}", address, value);
                Ok(value)
            }
            other => Err(unexpected_body(CommandKind::ReadEeprom, &other)),
        }
    }

    /// Writes `value` at `address`.
    pub fn write(&mut self, address: u8, value: u8) -> Result<()> {
        check_address(address)?;
        trace!("EEPROM[{}] <- 0x{:02X}", address, value);
        self.device
            .send_command(&Command::WriteEeprom { address, value })?;
        Ok(())
    }

    /// Reads every address in `range`, clamped to the EEPROM size.
    ///
    /// An empty range (including one that starts past the end) returns an
    /// empty vector without talking to the chip.
    pub fn read_range(&mut self, range: impl RangeBounds<u8>) -> Result<Vec<u8>> {
        let range = clamp_range(range);
        debug!("Reading EEPROM {:?}", range);
        // Addresses below SIZE fit in u8.
        range.map(|address| self.read(address as u8)).collect()
    }

    /// Writes `values` to consecutive addresses starting at `start`.
    ///
    /// Values that would land past the last address are dropped. A failure
    /// part way returns [`Error::PartialWrite`]; bytes already written are not
    /// rolled back.
    pub fn write_range(&mut self, start: u8, values: &[u8]) -> Result<()> {
        let start_addr = usize::from(start);
        let fits = SIZE.saturating_sub(start_addr).min(values.len());
        if fits < values.len() {
            debug!(
                "Dropping {} bytes past the end of EEPROM",
                values.len() - fits
            );
        }
        debug!("Writing {} bytes to EEPROM at {}", fits, start);
        for (completed, &value) in values[..fits].iter().enumerate() {
            // Addresses below SIZE fit in u8.
            let address = (start_addr + completed) as u8;
            self.write(address, value)
                .map_err(|source| Error::PartialWrite {
                    completed,
                    address,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}
