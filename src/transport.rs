//! Byte-level link to the chip.
//!
//! The session only ever writes one request report and then reads one response
//! report. [`Transport`] captures exactly that, so a simulated chip can stand in
//! for the USB device in tests.

use crate::error::{Error, Result};
use hidapi::HidDevice;
use log::{trace, warn};
use std::io;

/// Blocking report transport.
pub trait Transport {
    /// Writes one outgoing report.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Reads one incoming report into `buf` and returns its length.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

/// Outgoing frame layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    /// Prepend one zero byte to every outgoing report. Windows HID stacks
    /// expect the (unused) report ID there; incoming reports never carry it.
    pub prepend_pad_byte: bool,
}

impl Default for Framing {
    fn default() -> Self {
        Framing {
            prepend_pad_byte: cfg!(target_os = "windows"),
        }
    }
}

impl Framing {
    /// Builds the bytes handed to the OS for one outgoing report.
    pub fn frame(&self, data: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(data.len() + 1);
        if self.prepend_pad_byte {
            buf.push(0);
        }
        buf.extend_from_slice(data);
        buf
    }
}

/// [`Transport`] over an opened `hidapi` device.
pub struct HidTransport {
    device: HidDevice,
    framing: Framing,
    read_timeout_ms: i32,
}

impl HidTransport {
    /// Wraps an opened device. A `read_timeout_ms` of `-1` blocks indefinitely.
    pub fn new(device: HidDevice, framing: Framing, read_timeout_ms: i32) -> Self {
        HidTransport {
            device,
            framing,
            read_timeout_ms,
        }
    }

    /// The underlying HID handle.
    pub fn device(&self) -> &HidDevice {
        &self.device
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn set_read_timeout_ms(&mut self, timeout_ms: i32) {
        self.read_timeout_ms = timeout_ms;
    }
}

impl std::fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidTransport")
            .field("framing", &self.framing)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl Transport for HidTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let buf = self.framing.frame(data);
        trace!("HID write ({} bytes): {:02X?}", buf.len(), &buf[..]);
        let written = self.device.write(&buf)?;
        if written < buf.len() {
            warn!("Short HID write: {} of {} bytes", written, buf.len());
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {} of {} bytes", written, buf.len()),
            )));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self.device.read_timeout(buf, self.read_timeout_ms)?;
        if len == 0 {
            trace!("HID read timed out after {} ms", self.read_timeout_ms);
            return Err(Error::Timeout);
        }
        trace!("HID read ({} bytes): {:02X?}", len, &buf[..len]);
        Ok(len)
    }
}
