//! Internal constants: command codes, status codes, report offsets and limits.

// Default Vendor/Product IDs
/// Microchip Technology vendor ID.
pub const MICROCHIP_VID: u16 = 0x04D8;
/// Default product ID of the MCP2210 HID interface.
pub const MCP2210_PID: u16 = 0x00DE;

/// Size of every report exchanged with the MCP2210, in both directions.
pub const REPORT_LEN: usize = 64;
/// First payload byte of a command report (bytes 0-3 are the header).
pub const PAYLOAD_OFFSET: usize = 4;
/// Largest payload that fits after the 4-byte header.
pub const MAX_PAYLOAD_LEN: usize = REPORT_LEN - PAYLOAD_OFFSET;

/// Number of GP pins on the MCP2210.
pub const GPIO_COUNT: usize = 9;
/// Mask covering GP0-GP8 in the 16-bit pin registers.
pub const GPIO_MASK: u16 = 0x01FF;

// --- Command codes (byte 0 of every report) ---
pub mod cmd {
    pub const GET_CHIP_STATUS: u8 = 0x10;
    pub const CANCEL_SPI_TRANSFER: u8 = 0x11;
    pub const GET_INTERRUPT_COUNT: u8 = 0x12;
    pub const GET_CHIP_SETTINGS: u8 = 0x20;
    pub const SET_CHIP_SETTINGS: u8 = 0x21;
    pub const SET_GPIO_VALUES: u8 = 0x30;
    pub const GET_GPIO_VALUES: u8 = 0x31;
    pub const SET_GPIO_DIRECTIONS: u8 = 0x32;
    pub const GET_GPIO_DIRECTIONS: u8 = 0x33;
    pub const SET_SPI_SETTINGS: u8 = 0x40;
    pub const GET_SPI_SETTINGS: u8 = 0x41;
    pub const SPI_TRANSFER: u8 = 0x42;
    pub const READ_EEPROM: u8 = 0x50;
    pub const WRITE_EEPROM: u8 = 0x51;
    pub const SET_NVRAM: u8 = 0x60;
    pub const GET_NVRAM: u8 = 0x61;
    pub const SEND_PASSWORD: u8 = 0x70;
    pub const RELEASE_SPI_BUS: u8 = 0x80;
}

// --- NVRAM sub-commands (byte 1 of Set/Get NVRAM reports) ---
pub mod nvram {
    pub const SPI_SETTINGS: u8 = 0x10;
    pub const CHIP_SETTINGS: u8 = 0x20;
    pub const USB_KEY: u8 = 0x30;
    pub const PRODUCT_NAME: u8 = 0x40;
    pub const MANUFACTURER_NAME: u8 = 0x50;
}

// --- Status codes (byte 1 of every response) ---
pub mod status {
    pub const SUCCESS: u8 = 0x00;
    /// SPI bus is owned by an external master.
    pub const BUS_NOT_AVAILABLE: u8 = 0xF7;
    /// A transfer is in progress; the data or settings were not accepted.
    pub const TRANSFER_IN_PROGRESS: u8 = 0xF8;
    /// Command code not recognised by the firmware.
    pub const UNKNOWN_COMMAND: u8 = 0xF9;
    /// EEPROM write did not verify.
    pub const WRITE_FAILURE: u8 = 0xFA;
    /// Wrong password, or settings are protected.
    pub const ACCESS_REJECTED: u8 = 0xFB;
    /// Settings are permanently locked.
    pub const ACCESS_LOCKED: u8 = 0xFC;
    /// Too many failed password attempts since power-up.
    pub const ACCESS_BLOCKED: u8 = 0xFD;
}

// --- SPI engine status (byte 3 of a SPI transfer response) ---
pub mod engine {
    /// No more data to send; the transaction has ended.
    pub const FINISHED: u8 = 0x10;
    /// Transaction started, nothing received yet.
    pub const STARTED_NO_DATA: u8 = 0x20;
    /// Transaction running, received data is in this response.
    pub const DATA_RECEIVED: u8 = 0x30;
}

// --- Response field offsets, per command family ---
pub mod offsets {
    /// SPI transfer response: number of received bytes.
    pub const SPI_RX_LEN: usize = 2;
    /// SPI transfer response: engine status.
    pub const SPI_ENGINE_STATUS: usize = 3;
    /// SPI transfer request/response: data bytes.
    pub const SPI_DATA: usize = 4;
    /// SPI transfer request: chunk length.
    pub const SPI_TX_LEN: usize = 1;

    /// EEPROM read response: address echo.
    pub const EEPROM_ADDR: usize = 2;
    /// EEPROM read response: data byte.
    pub const EEPROM_DATA: usize = 3;
    /// EEPROM requests: address and data bytes.
    pub const EEPROM_REQ_ADDR: usize = 1;
    pub const EEPROM_REQ_DATA: usize = 2;

    /// Chip status / cancel transfer responses.
    pub const STATUS_BUS_RELEASE: usize = 2;
    pub const STATUS_BUS_OWNER: usize = 3;
    pub const STATUS_PASSWORD_ATTEMPTS: usize = 4;
    pub const STATUS_PASSWORD_GUESSED: usize = 5;

    /// USB key parameters as laid out in a Set NVRAM request.
    pub const USB_SET_VID: usize = 4;
    pub const USB_SET_PID: usize = 6;
    pub const USB_SET_POWER: usize = 8;
    pub const USB_SET_CURRENT: usize = 9;
    /// USB key parameters as laid out in a Get NVRAM response.
    pub const USB_GET_VID: usize = 12;
    pub const USB_GET_PID: usize = 14;
    pub const USB_GET_POWER: usize = 29;
    pub const USB_GET_CURRENT: usize = 30;

    /// USB string descriptors (both directions).
    pub const STRING_LEN: usize = 4;
    pub const STRING_TYPE: usize = 5;
    pub const STRING_DATA: usize = 6;

    /// Interrupt counter response.
    pub const INTERRUPT_COUNT: usize = 4;
    /// Interrupt counter request: reset selector.
    pub const INTERRUPT_RESET: usize = 1;

    /// Release SPI bus request: value driven on the bus-release ACK pin.
    pub const RELEASE_ACK_VALUE: usize = 1;
}

// --- SPI transfer limits ---
pub mod spi {
    /// Data bytes carried by one SPI transfer report.
    pub const MAX_CHUNK_LEN: usize = 60;
    /// Largest transfer the engine can track (`bytes_per_transaction` is 16 bit).
    pub const MAX_TRANSFER_LEN: usize = 0xFFFF;
    /// Default retry budget for a bulk transfer.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2000;
    /// Default HID read timeout (milliseconds, -1 blocks).
    pub const DEFAULT_READ_TIMEOUT_MS: i32 = 1000;
}

// --- Chip settings bits ---
pub mod chip {
    /// Access-control byte values.
    pub const ACCESS_UNPROTECTED: u8 = 0x00;
    pub const ACCESS_PROTECTED: u8 = 0x40;
    pub const ACCESS_LOCKED: u8 = 0x80;

    /// Other chip settings byte (offset 17): bit positions.
    pub const REMOTE_WAKEUP_BIT: usize = 4;
    pub const INTERRUPT_MODE_BITS: core::ops::Range<usize> = 1..4;
    pub const SPI_BUS_RELEASE_BIT: usize = 0;

    pub const PASSWORD_LEN: usize = 8;
}

// --- USB descriptor limits ---
pub mod usb {
    /// Longest manufacturer/product string, in UTF-16 code units.
    pub const MAX_STRING_UNITS: usize = 29;
    /// bDescriptorType of a USB string descriptor.
    pub const STRING_DESCRIPTOR_TYPE: u8 = 0x03;
    /// Largest requested current, in mA (stored halved in one byte).
    pub const MAX_REQUESTED_CURRENT_MA: u16 = 510;

    pub const POWER_HOST_POWERED: u8 = 1 << 7;
    pub const POWER_SELF_POWERED: u8 = 1 << 6;
    pub const POWER_REMOTE_WAKEUP: u8 = 1 << 5;
}
