//! SRAM access through the CPLD memory adapter.
//!
//! The CPLD decodes a 7-byte SPI packet: a 17-bit word address spread over
//! the first three bytes with the read/write flag in bit 0, then the 32-bit
//! data word, least significant byte first. The adapter's chip select is GP1.

use crate::device::Mcp2210;
use crate::error::{invalid_address, invalid_setting, Error, Result};
use crate::fields::parse_value;
use crate::settings::{PinDesignation, SettingsTarget};
use crate::transport::HidChannel;
use log::{debug, trace};

/// Highest word address (17 bits).
pub const MAX_ADDRESS: u32 = 131_071;
/// Bytes in one adapter packet.
pub const PACKET_LEN: usize = 7;

const SPI_BIT_RATE: u32 = 3_000_000;
const CS_TO_DATA_DELAY: u16 = 1;
const DATA_TO_CS_DELAY: u16 = 1;
const DATA_TO_DATA_DELAY: u16 = 0;
/// GP1 high when idle, low when active.
const IDLE_CS: u16 = 0x0002;
const ACTIVE_CS: u16 = 0x0000;

/// One 32-bit SRAM word and its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWord {
    pub address: u32,
    pub data: u32,
}

/// Row/column access to tabular text, e.g. a parsed CSV file.
pub trait CellSource {
    fn rows(&self) -> usize;
    fn columns(&self) -> usize;
    /// Cell text, or `None` past the end of a short row.
    fn cell(&self, row: usize, column: usize) -> Option<&str>;
}

impl<S: AsRef<str>> CellSource for Vec<Vec<S>> {
    fn rows(&self) -> usize {
        self.len()
    }

    fn columns(&self) -> usize {
        self.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.get(row)?.get(column).map(AsRef::as_ref)
    }
}

fn check_address(address: u32) -> Result<()> {
    if address > MAX_ADDRESS {
        return Err(invalid_address(
            address,
            format!("SRAM addresses are 0-{}", MAX_ADDRESS),
        ));
    }
    Ok(())
}

/// Builds the adapter packet for `address`.
pub fn encode_packet(read: bool, address: u32, data: u32) -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = (((address & 0x3) as u8) << 6) | u8::from(read);
    packet[1] = ((address >> 2) & 0xFF) as u8;
    packet[2] = ((address >> 10) & 0x7F) as u8;
    packet[3..].copy_from_slice(&data.to_le_bytes());
    packet
}

/// Decodes one row of a data file into a word.
///
/// Two cells are `address, word` (decimal or `0x` hex). Seven cells are the
/// sample-generator layout, all hex bytes: the address as
/// `addr >> 15, addr >> 7, addr << 1` and the word as four bytes, most
/// significant first. Empty cells (e.g. from a trailing comma) are ignored.
/// Returns `Ok(None)` for blank rows.
fn decode_row(source: &dyn CellSource, row: usize) -> Result<Option<MemoryWord>> {
    let cells: Vec<(usize, &str)> = (0..source.columns())
        .filter_map(|col| source.cell(row, col).map(|c| (col, c.trim())))
        .filter(|(_, c)| !c.is_empty())
        .collect();
    let row_name = format!("row {}", row + 1);

    let word = match cells.len() {
        0 => return Ok(None),
        2 => {
            let mut values = [0u32; 2];
            for (value, (col, text)) in values.iter_mut().zip(&cells) {
                let parsed = parse_value(text, &[])
                    .map_err(|msg| invalid_setting(&row_name, &format!("column {}", col + 1), msg))?;
                *value = u32::try_from(parsed).map_err(|_| {
                    invalid_setting(
                        &row_name,
                        &format!("column {}", col + 1),
                        format!("{} does not fit in 32 bits", parsed),
                    )
                })?;
            }
            MemoryWord {
                address: values[0],
                data: values[1],
            }
        }
        7 => {
            let mut bytes = [0u32; 7];
            for (byte, (col, text)) in bytes.iter_mut().zip(&cells) {
                *byte = u8::from_str_radix(text, 16)
                    .map(u32::from)
                    .map_err(|_| {
                        invalid_setting(
                            &row_name,
                            &format!("column {}", col + 1),
                            format!("'{}' is not a hex byte", text),
                        )
                    })?;
            }
            MemoryWord {
                address: ((bytes[0] & 0x3) << 15) | (bytes[1] << 7) | (bytes[2] >> 1),
                data: (bytes[3] << 24) | (bytes[4] << 16) | (bytes[5] << 8) | bytes[6],
            }
        }
        n => {
            return Err(invalid_setting(
                &row_name,
                "",
                format!("expected 2 or 7 cells, found {}", n),
            ))
        }
    };
    check_address(word.address)?;
    Ok(Some(word))
}

/// Word-level access to the SRAM behind the CPLD.
pub struct SramAdapter<'a, C: HidChannel> {
    bridge: &'a mut Mcp2210<C>,
}

impl<'a, C: HidChannel> SramAdapter<'a, C> {
    pub fn new(bridge: &'a mut Mcp2210<C>) -> Self {
        SramAdapter { bridge }
    }

    /// Sets up the current chip settings for the adapter board: GP0 as a
    /// GPIO, GP1 as chip select, GP5 as its dedicated function, all GPIOs
    /// outputs driven high.
    pub fn configure_pins(&mut self) -> Result<()> {
        let mut chip = self.bridge.read_chip_settings(SettingsTarget::Current)?;
        chip.pins[0] = PinDesignation::Gpio;
        chip.pins[1] = PinDesignation::ChipSelect;
        chip.pins[5] = PinDesignation::Dedicated;
        chip.default_direction = 0x0000;
        chip.default_output = 0x01FF;
        debug!("Configuring pins for the SRAM adapter");
        self.bridge
            .write_chip_settings(SettingsTarget::Current, &chip)
    }

    pub fn write_word(&mut self, address: u32, data: u32) -> Result<()> {
        check_address(address)?;
        trace!("SRAM[{}] <- 0x{:08X}", address, data);
        self.transaction(&encode_packet(false, address, data))?;
        Ok(())
    }

    pub fn read_word(&mut self, address: u32) -> Result<u32> {
        check_address(address)?;
        let rx = self.transaction(&encode_packet(true, address, 0))?;
        if rx.len() != PACKET_LEN {
            return Err(Error::InvalidReport(format!(
                "SRAM read returned {} of {} bytes",
                rx.len(),
                PACKET_LEN
            )));
        }
        let data = u32::from_le_bytes([rx[3], rx[4], rx[5], rx[6]]);
        trace!("SRAM[{}] = 0x{:08X}", address, data);
        Ok(data)
    }

    /// Writes each word in order. All addresses are checked before any I/O.
    pub fn write_words(&mut self, words: &[MemoryWord]) -> Result<()> {
        for word in words {
            check_address(word.address)?;
        }
        for word in words {
            self.write_word(word.address, word.data)?;
        }
        Ok(())
    }

    /// Decodes every row of `source` and writes the words. The whole source
    /// is validated before the first write. Returns the number of words written.
    pub fn load(&mut self, source: &dyn CellSource) -> Result<usize> {
        let mut words = Vec::with_capacity(source.rows());
        for row in 0..source.rows() {
            if let Some(word) = decode_row(source, row)? {
                words.push(word);
            }
        }
        debug!("Loading {} words into SRAM", words.len());
        self.write_words(&words)?;
        Ok(words.len())
    }

    /// Runs one SPI transaction with the adapter's timing.
    fn transaction(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        let mut spi = self.bridge.read_spi_settings(SettingsTarget::Current)?;
        spi.bit_rate = SPI_BIT_RATE;
        spi.cs_to_data_delay = CS_TO_DATA_DELAY;
        spi.last_data_to_cs_delay = DATA_TO_CS_DELAY;
        spi.data_to_data_delay = DATA_TO_DATA_DELAY;
        spi.idle_cs = IDLE_CS;
        spi.active_cs = ACTIVE_CS;
        self.bridge.spi_transfer_with(&mut spi, tx)
    }
}
