//! The fixed 64-byte report exchanged with the chip.

use crate::consts::REPORT_SIZE;
use std::fmt;

/// One 64-byte HID report. Unused bytes are zero.
#[derive(Clone, PartialEq, Eq)]
pub struct Report([u8; REPORT_SIZE]);

impl Report {
    /// Creates a zeroed report starting with `opcode`.
    pub fn new(opcode: u8) -> Self {
        let mut buf = [0u8; REPORT_SIZE];
        buf[0] = opcode;
        Report(buf)
    }

    /// Copies `bytes` into a new report, zero padding the tail.
    /// Returns `None` if `bytes` is longer than a report.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > REPORT_SIZE {
            return None;
        }
        let mut buf = [0u8; REPORT_SIZE];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Report(buf))
    }

    #[inline]
    pub fn opcode(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.0
    }

    #[inline]
    pub fn byte(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    #[inline]
    pub fn set_byte(&mut self, offset: usize, value: u8) {
        self.0[offset] = value;
    }

    pub fn set_u16(&mut self, offset: usize, value: u16) {
        self.0[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) {
        self.0[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_bytes(&mut self, offset: usize, data: &[u8]) {
        self.0[offset..offset + data.len()].copy_from_slice(data);
    }
}

impl AsRef<[u8]> for Report {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Report({:02X?})", &self.0[..])
    }
}

// Little-endian readers over received frames. Callers check the frame length first.
#[inline]
pub(crate) fn read_u16(frame: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([frame[offset], frame[offset + 1]])
}

#[inline]
pub(crate) fn read_u32(frame: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        frame[offset],
        frame[offset + 1],
        frame[offset + 2],
        frame[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_zero_padded() {
        let report = Report::new(0x42);
        assert_eq!(report.as_bytes().len(), REPORT_SIZE);
        assert_eq!(report.opcode(), 0x42);
        assert!(report.as_bytes()[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_little_endian_fields() {
        let mut report = Report::new(0x40);
        report.set_u32(4, 0x0012_D687);
        report.set_u16(8, 0x01FF);
        assert_eq!(&report.as_bytes()[4..10], &[0x87, 0xD6, 0x12, 0x00, 0xFF, 0x01]);
        assert_eq!(read_u32(report.as_ref(), 4), 0x0012_D687);
        assert_eq!(read_u16(report.as_ref(), 8), 0x01FF);
    }

    #[test]
    fn test_from_slice_limits() {
        assert!(Report::from_slice(&[0u8; REPORT_SIZE + 1]).is_none());
        let report = Report::from_slice(&[0x11, 0x00]).unwrap();
        assert_eq!(report.opcode(), 0x11);
        assert_eq!(report.as_bytes()[63], 0);
    }
}
