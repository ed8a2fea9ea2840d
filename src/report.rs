//! The 64-byte command/response report exchanged with the MCP2210.
//!
//! Every command report starts with a 4-byte header: the command code, a
//! sub-command (or 0), and two reserved bytes. Payload starts at byte 4.
//! Responses echo the command code in byte 0 and carry a status byte in
//! byte 1. Multi-byte fields are little-endian.

use crate::consts::{self, cmd, nvram, MAX_PAYLOAD_LEN, PAYLOAD_OFFSET, REPORT_LEN};
use crate::error::{Error, Result};

/// MCP2210 HID command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetChipStatus,
    CancelSpiTransfer,
    GetInterruptCount,
    GetChipSettings,
    SetChipSettings,
    SetGpioValues,
    GetGpioValues,
    SetGpioDirections,
    GetGpioDirections,
    SetSpiSettings,
    GetSpiSettings,
    SpiTransfer,
    ReadEeprom,
    WriteEeprom,
    SetNvram(NvramSection),
    GetNvram(NvramSection),
    SendPassword,
    ReleaseSpiBus,
}

/// Sections of the power-up (NVRAM) settings, selected by the sub-command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NvramSection {
    Spi,
    Chip,
    UsbKey,
    ProductName,
    ManufacturerName,
}

impl NvramSection {
    /// Sub-command byte for this section.
    pub fn code(self) -> u8 {
        match self {
            NvramSection::Spi => nvram::SPI_SETTINGS,
            NvramSection::Chip => nvram::CHIP_SETTINGS,
            NvramSection::UsbKey => nvram::USB_KEY,
            NvramSection::ProductName => nvram::PRODUCT_NAME,
            NvramSection::ManufacturerName => nvram::MANUFACTURER_NAME,
        }
    }
}

impl Command {
    /// Command code written to byte 0.
    pub fn code(self) -> u8 {
        match self {
            Command::GetChipStatus => cmd::GET_CHIP_STATUS,
            Command::CancelSpiTransfer => cmd::CANCEL_SPI_TRANSFER,
            Command::GetInterruptCount => cmd::GET_INTERRUPT_COUNT,
            Command::GetChipSettings => cmd::GET_CHIP_SETTINGS,
            Command::SetChipSettings => cmd::SET_CHIP_SETTINGS,
            Command::SetGpioValues => cmd::SET_GPIO_VALUES,
            Command::GetGpioValues => cmd::GET_GPIO_VALUES,
            Command::SetGpioDirections => cmd::SET_GPIO_DIRECTIONS,
            Command::GetGpioDirections => cmd::GET_GPIO_DIRECTIONS,
            Command::SetSpiSettings => cmd::SET_SPI_SETTINGS,
            Command::GetSpiSettings => cmd::GET_SPI_SETTINGS,
            Command::SpiTransfer => cmd::SPI_TRANSFER,
            Command::ReadEeprom => cmd::READ_EEPROM,
            Command::WriteEeprom => cmd::WRITE_EEPROM,
            Command::SetNvram(_) => cmd::SET_NVRAM,
            Command::GetNvram(_) => cmd::GET_NVRAM,
            Command::SendPassword => cmd::SEND_PASSWORD,
            Command::ReleaseSpiBus => cmd::RELEASE_SPI_BUS,
        }
    }

    /// Sub-command byte written to byte 1 (0 for commands without one).
    pub fn subcommand(self) -> u8 {
        match self {
            Command::SetNvram(section) | Command::GetNvram(section) => section.code(),
            _ => 0x00,
        }
    }
}

/// One 64-byte report, in either direction.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Report([u8; REPORT_LEN]);

impl Report {
    /// An all-zero report.
    pub fn zeroed() -> Self {
        Report([0u8; REPORT_LEN])
    }

    /// Builds a report for `command` with an empty payload.
    pub fn new(command: Command) -> Self {
        let mut report = Self::zeroed();
        report.0[0] = command.code();
        report.0[1] = command.subcommand();
        report
    }

    /// Builds a report: command code, sub-command, payload from byte 4, zero padding.
    ///
    /// Fails if the payload does not fit in the 60 bytes after the header.
    pub fn encode(command: u8, subcommand: u8, payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::OperationTooLarge {
                max: MAX_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }
        let mut report = Self::zeroed();
        report.0[0] = command;
        report.0[1] = subcommand;
        report.0[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
        Ok(report)
    }

    /// Wraps a raw 64-byte buffer (e.g. one read from the device).
    pub fn from_bytes(bytes: [u8; REPORT_LEN]) -> Self {
        Report(bytes)
    }

    /// Echoed command code (byte 0) and status code (byte 1).
    pub fn decode_status(&self) -> (u8, u8) {
        (self.0[0], self.0[1])
    }

    /// Command code in byte 0.
    pub fn command(&self) -> u8 {
        self.0[0]
    }

    /// Status code in byte 1 of a response.
    pub fn status(&self) -> u8 {
        self.0[1]
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; REPORT_LEN] {
        &mut self.0
    }

    /// Payload region (bytes 4..64).
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_OFFSET..]
    }

    pub fn u8_at(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    pub fn u16_at(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.0[offset], self.0[offset + 1]])
    }

    pub fn u32_at(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.0[offset],
            self.0[offset + 1],
            self.0[offset + 2],
            self.0[offset + 3],
        ])
    }

    /// Writes one byte. The command code at index 0 cannot be overwritten.
    pub fn set_u8(&mut self, offset: usize, value: u8) {
        assert!(offset != 0, "Cannot overwrite the command byte.");
        self.0[offset] = value;
    }

    pub fn set_u16(&mut self, offset: usize, value: u16) {
        assert!(offset != 0, "Cannot overwrite the command byte.");
        self.0[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) {
        assert!(offset != 0, "Cannot overwrite the command byte.");
        self.0[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) {
        assert!(offset != 0, "Cannot overwrite the command byte.");
        self.0[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn bytes_at(&self, offset: usize, len: usize) -> &[u8] {
        &self.0[offset..offset + len]
    }
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Trailing zero padding is noise in logs.
        let used = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(consts::PAYLOAD_OFFSET, |i| (i + 1).max(consts::PAYLOAD_OFFSET));
        write!(f, "Report({:02X?}", &self.0[..used])?;
        if used < REPORT_LEN {
            write!(f, " + {} zero bytes", REPORT_LEN - used)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pads_with_zeros() {
        let report = Report::encode(0x42, 0x00, &[0xAA, 0xBB]).unwrap();
        let bytes = report.as_bytes();
        assert_eq!(&bytes[..6], &[0x42, 0x00, 0x00, 0x00, 0xAA, 0xBB]);
        assert!(bytes[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        assert!(Report::encode(0x42, 0, &[0u8; 60]).is_ok());
        assert!(matches!(
            Report::encode(0x42, 0, &[0u8; 61]),
            Err(Error::OperationTooLarge { max: 60, actual: 61 })
        ));
    }

    #[test]
    fn test_nvram_subcommands() {
        let report = Report::new(Command::GetNvram(NvramSection::UsbKey));
        assert_eq!(&report.as_bytes()[..2], &[0x61, 0x30]);
        let report = Report::new(Command::SetNvram(NvramSection::ManufacturerName));
        assert_eq!(&report.as_bytes()[..2], &[0x60, 0x50]);
        let report = Report::new(Command::SpiTransfer);
        assert_eq!(&report.as_bytes()[..2], &[0x42, 0x00]);
    }

    #[test]
    fn test_little_endian_fields() {
        let mut report = Report::new(Command::SetSpiSettings);
        report.set_u32(4, 0x002D_C6C0);
        report.set_u16(8, 0x0102);
        assert_eq!(&report.as_bytes()[4..10], &[0xC0, 0xC6, 0x2D, 0x00, 0x02, 0x01]);
        assert_eq!(report.u32_at(4), 3_000_000);
        assert_eq!(report.u16_at(8), 0x0102);
    }

    #[test]
    fn test_decode_status() {
        let mut raw = [0u8; 64];
        raw[0] = 0x42;
        raw[1] = 0xF7;
        assert_eq!(Report::from_bytes(raw).decode_status(), (0x42, 0xF7));
    }

    #[test]
    #[should_panic(expected = "command byte")]
    fn test_command_byte_is_protected() {
        Report::new(Command::GetChipStatus).set_u8(0, 0xFF);
    }
}
