//! Internal constants: USB IDs, opcodes, sub-commands and report geometry.

// Default Vendor/Product IDs
/// Microchip Technology vendor ID.
pub const MICROCHIP_VID: u16 = 0x04D8;
/// Default MCP2210 product ID.
pub const MCP2210_PID: u16 = 0x00DE;

/// Every report is exactly this long in both directions.
pub const REPORT_SIZE: usize = 64;

/// Command opcodes (byte 0 of every request, echoed in byte 0 of the response).
pub mod opcode {
    pub const GET_CHIP_STATUS: u8 = 0x10;
    pub const CANCEL_TRANSFER: u8 = 0x11;
    pub const GET_INTERRUPT_COUNT: u8 = 0x12;
    pub const GET_CHIP_SETTINGS: u8 = 0x20;
    pub const SET_CHIP_SETTINGS: u8 = 0x21;
    pub const SET_GPIO_VALUE: u8 = 0x30;
    pub const GET_GPIO_VALUE: u8 = 0x31;
    pub const SET_GPIO_DIRECTION: u8 = 0x32;
    pub const GET_GPIO_DIRECTION: u8 = 0x33;
    pub const SET_SPI_SETTINGS: u8 = 0x40;
    pub const GET_SPI_SETTINGS: u8 = 0x41;
    pub const SPI_TRANSFER: u8 = 0x42;
    pub const READ_EEPROM: u8 = 0x50;
    pub const WRITE_EEPROM: u8 = 0x51;
    pub const SET_NVRAM: u8 = 0x60;
    pub const GET_NVRAM: u8 = 0x61;
    pub const SEND_PASSWORD: u8 = 0x70;
    pub const REQUEST_BUS_RELEASE: u8 = 0x80;
}

/// NVRAM sub-commands (byte 1 of Set/Get NVRAM requests).
pub mod nvram {
    pub const SPI_SETTINGS: u8 = 0x10;
    pub const CHIP_SETTINGS: u8 = 0x20;
    pub const USB_KEY_PARAMS: u8 = 0x30;
    pub const USB_PRODUCT: u8 = 0x40;
    pub const USB_MANUFACTURER: u8 = 0x50;
}

/// Raw status codes (byte 1 of every response).
pub mod status {
    pub const SUCCESS: u8 = 0x00;
    pub const SPI_BUS_UNAVAILABLE: u8 = 0xF7;
    pub const TRANSFER_IN_PROGRESS: u8 = 0xF8;
    pub const EEPROM_WRITE_FAILURE: u8 = 0xFA;
    pub const ACCESS_BLOCKED: u8 = 0xFB;
    pub const ACCESS_REJECTED: u8 = 0xFC;
    pub const ACCESS_DENIED: u8 = 0xFD;
}

// --- SPI Related Constants ---
pub mod spi {
    /// Maximum payload carried by a single SPI transfer report.
    pub const MAX_CHUNK: usize = 60;
    /// Offset of the payload in both the request and the response.
    pub const DATA_OFFSET: usize = 4;
    /// Value of response byte 2 for Get SPI Settings (record size).
    pub const SETTINGS_RECORD_SIZE: u8 = 0x11;

    // SPI engine status (response byte 3)
    pub const ENGINE_FINISHED: u8 = 0x10;
    pub const ENGINE_STARTED_NO_DATA: u8 = 0x20;
    pub const ENGINE_DATA_AVAILABLE: u8 = 0x30;
}

// --- EEPROM Related Constants ---
pub mod eeprom {
    /// Number of addressable EEPROM locations (addresses `0..SIZE`).
    pub const SIZE: usize = 255;
}

// --- GPIO Related Constants ---
pub mod gpio {
    /// GP0..GP8.
    pub const PIN_COUNT: u8 = 9;
}

// --- USB descriptor strings ---
pub mod usb_string {
    /// USB string descriptor type, stored at byte 5 of string reports.
    pub const DESCRIPTOR_TYPE: u8 = 0x03;
    /// Maximum number of UTF-16 code units in a manufacturer/product string.
    pub const MAX_CHARS: usize = 29;
    pub const LENGTH_OFFSET: usize = 4;
    pub const CHARS_OFFSET: usize = 6;
}

/// Password length for Send Password and NVRAM chip settings.
pub const PASSWORD_LEN: usize = 8;
