//! DAC5687 serial register protocol over the MCP2210 SPI bus.
//!
//! Every access is one SPI transaction: an instruction byte followed by one
//! to four data bytes. The instruction byte carries the direction (bit 7),
//! the burst length minus one (bits 6:5) and the 5-bit start address.
//! The converter's chip select is GP0.

pub mod registers;
pub mod settings;

pub use registers::ConverterSettings;

use crate::device::Mcp2210;
use crate::error::{invalid_address, Error, Result};
use crate::settings::{SettingsTarget, SpiMode};
use crate::transport::HidChannel;
use log::{debug, trace};
use registers::{is_reserved, CONFIGURED_REGISTERS, MAX_ADDRESS, MAX_BURST};

/// SPI clock used for register access.
pub const SPI_BIT_RATE: u32 = 3_000_000;
const CS_TO_DATA_DELAY: u16 = 10;
const DATA_TO_CS_DELAY: u16 = 10;
const DATA_TO_DATA_DELAY: u16 = 0;
/// GP0 high when idle, low when active.
const IDLE_CS: u16 = 0x0001;
const ACTIVE_CS: u16 = 0x0000;

/// Builds the instruction byte for a `len`-byte access at `address`.
///
/// `len` must be 1-4 and `address` at most 0x1F.
pub fn instruction_byte(read: bool, address: u8, len: usize) -> Result<u8> {
    if len == 0 || len > MAX_BURST {
        return Err(Error::ArgumentOutOfRange(format!(
            "DAC5687 burst length {} out of range (1-{})",
            len, MAX_BURST
        )));
    }
    if address > MAX_ADDRESS {
        return Err(invalid_address(
            u32::from(address),
            "DAC5687 registers are 0x00-0x1F",
        ));
    }
    Ok((u8::from(read) << 7) | (((len - 1) as u8) << 5) | address)
}

/// Checks that a burst of `len` registers from `start` is legal and returns
/// its write instruction byte.
fn check_burst(start: u8, len: usize) -> Result<u8> {
    let instruction = instruction_byte(false, start, len)?;
    for offset in 0..len {
        let address = u32::from(start) + offset as u32;
        if address > u32::from(MAX_ADDRESS) {
            return Err(invalid_address(address, "DAC5687 registers are 0x00-0x1F"));
        }
        if is_reserved(address as u8) {
            return Err(invalid_address(address, "reserved DAC5687 register"));
        }
    }
    Ok(instruction)
}

/// Register-level access to a DAC5687 behind an MCP2210.
pub struct Dac5687<'a, C: HidChannel> {
    bridge: &'a mut Mcp2210<C>,
}

impl<'a, C: HidChannel> Dac5687<'a, C> {
    pub fn new(bridge: &'a mut Mcp2210<C>) -> Self {
        Dac5687 { bridge }
    }

    pub fn write_register(&mut self, address: u8, value: u8) -> Result<()> {
        self.write_registers(address, &[value])
    }

    pub fn read_register(&mut self, address: u8) -> Result<u8> {
        let bytes = self.read_registers(address, 1)?;
        Ok(bytes[0])
    }

    /// Writes 1-4 consecutive registers starting at `start`.
    pub fn write_registers(&mut self, start: u8, data: &[u8]) -> Result<()> {
        let instruction = check_burst(start, data.len())?;
        let mut tx = Vec::with_capacity(data.len() + 1);
        tx.push(instruction);
        tx.extend_from_slice(data);
        trace!("DAC5687 write 0x{:02X}: {:02X?}", start, data);
        self.transaction(&tx)?;
        Ok(())
    }

    /// Reads 1-4 consecutive registers starting at `start`.
    pub fn read_registers(&mut self, start: u8, len: usize) -> Result<Vec<u8>> {
        check_burst(start, len)?;
        let mut tx = vec![0u8; len + 1];
        tx[0] = instruction_byte(true, start, len)?;
        let rx = self.transaction(&tx)?;
        if rx.len() != len + 1 {
            return Err(Error::InvalidReport(format!(
                "DAC5687 read returned {} of {} bytes",
                rx.len(),
                len + 1
            )));
        }
        trace!("DAC5687 read 0x{:02X}: {:02X?}", start, &rx[1..]);
        Ok(rx[1..].to_vec())
    }

    /// Writes the full configuration, one register at a time in address order.
    ///
    /// Stops at the first failure; registers already written keep their new
    /// values. The error names the register that failed.
    pub fn configure(&mut self, settings: &ConverterSettings) -> Result<()> {
        let regs = settings.to_registers();
        debug!("Configuring DAC5687 ({} registers)", CONFIGURED_REGISTERS.len());
        for &address in CONFIGURED_REGISTERS.iter() {
            self.write_register(address, regs[usize::from(address)])
                .map_err(|source| Error::Register {
                    address,
                    source: Box::new(source),
                })?;
        }
        debug!("DAC5687 configured");
        Ok(())
    }

    /// Runs one SPI transaction with the converter's timing.
    fn transaction(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        let mut spi = self.bridge.read_spi_settings(SettingsTarget::Current)?;
        spi.bit_rate = SPI_BIT_RATE;
        spi.cs_to_data_delay = CS_TO_DATA_DELAY;
        spi.last_data_to_cs_delay = DATA_TO_CS_DELAY;
        spi.data_to_data_delay = DATA_TO_DATA_DELAY;
        spi.idle_cs = IDLE_CS;
        spi.active_cs = ACTIVE_CS;
        spi.mode = SpiMode::Mode0;
        self.bridge.spi_transfer_with(&mut spi, tx)
    }
}
