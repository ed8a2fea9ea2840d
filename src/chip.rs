//! Chip settings, access password, EEPROM, chip status and the interrupt counter.

use crate::consts::offsets;
use crate::device::Mcp2210;
use crate::error::{Error, Result};
use crate::report::{Command, NvramSection, Report};
use crate::settings::{ChipSettings, ChipStatus, Password, SettingsTarget};
use crate::transport::HidChannel;
use log::{debug, trace};

/// Interrupt counter request byte: read and reset.
const INTERRUPT_READ_AND_RESET: u8 = 0x00;
/// Interrupt counter request byte: read only.
const INTERRUPT_READ_ONLY: u8 = 0xFF;

impl<C: HidChannel> Mcp2210<C> {
    // --- Chip Settings ---

    pub fn read_chip_settings(&mut self, target: SettingsTarget) -> Result<ChipSettings> {
        let request =
            Report::new(target.get_command(Command::GetChipSettings, NvramSection::Chip));
        let response = self.transfer(&request)?;
        let settings = ChipSettings::decode(&response)?;
        debug!("Read {:?} chip settings: {:?}", target, settings);
        Ok(settings)
    }

    /// Writes chip settings. For [`SettingsTarget::PowerUp`] the password
    /// field, when set, becomes the new NVRAM password.
    pub fn write_chip_settings(
        &mut self,
        target: SettingsTarget,
        settings: &ChipSettings,
    ) -> Result<()> {
        debug!("Writing {:?} chip settings: {:?}", target, settings);
        let mut request =
            Report::new(target.set_command(Command::SetChipSettings, NvramSection::Chip));
        settings.encode_into(&mut request, target);
        self.transfer(&request)?;
        Ok(())
    }

    /// Unlocks protected NVRAM settings for this power cycle.
    ///
    /// A wrong password fails with status 0xFB; after too many attempts the
    /// chip answers 0xFD until power-cycled.
    pub fn send_password(&mut self, password: &Password) -> Result<()> {
        debug!("Sending access password");
        let mut request = Report::new(Command::SendPassword);
        request.set_bytes(4, password.as_bytes());
        self.transfer(&request)?;
        Ok(())
    }

    // --- EEPROM ---

    pub fn read_eeprom(&mut self, address: u8) -> Result<u8> {
        let mut request = Report::new(Command::ReadEeprom);
        request.set_u8(offsets::EEPROM_REQ_ADDR, address);
        let response = self.transfer(&request)?;
        let echoed = response.u8_at(offsets::EEPROM_ADDR);
        if echoed != address {
            return Err(Error::InvalidReport(format!(
                "EEPROM read of 0x{:02X} answered for 0x{:02X}",
                address, echoed
            )));
        }
        let value = response.u8_at(offsets::EEPROM_DATA);
        trace!("EEPROM[0x{:02X}] = 0x{:02X}", address, value);
        Ok(value)
    }

    pub fn write_eeprom(&mut self, address: u8, value: u8) -> Result<()> {
        trace!("EEPROM[0x{:02X}] <- 0x{:02X}", address, value);
        let mut request = Report::new(Command::WriteEeprom);
        request.set_u8(offsets::EEPROM_REQ_ADDR, address);
        request.set_u8(offsets::EEPROM_REQ_DATA, value);
        self.transfer(&request)?;
        Ok(())
    }

    /// Reads `buf.len()` consecutive EEPROM bytes starting at `start`.
    pub fn read_eeprom_range(&mut self, start: u8, buf: &mut [u8]) -> Result<()> {
        if usize::from(start) + buf.len() > 256 {
            return Err(Error::ArgumentOutOfRange(format!(
                "EEPROM range 0x{:02X}+{} exceeds 256 bytes",
                start,
                buf.len()
            )));
        }
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_eeprom(start + i as u8)?;
        }
        Ok(())
    }

    // --- Status and Interrupts ---

    pub fn chip_status(&mut self) -> Result<ChipStatus> {
        let response = self.transfer(&Report::new(Command::GetChipStatus))?;
        let status = ChipStatus::decode(&response);
        debug!("Chip status: {:?}", status);
        Ok(status)
    }

    /// Reads the GP6 event counter, optionally resetting it.
    pub fn read_interrupt_count(&mut self, reset: bool) -> Result<u16> {
        let mut request = Report::new(Command::GetInterruptCount);
        request.set_u8(
            offsets::INTERRUPT_RESET,
            if reset {
                INTERRUPT_READ_AND_RESET
            } else {
                INTERRUPT_READ_ONLY
            },
        );
        let response = self.transfer(&request)?;
        let count = response.u16_at(offsets::INTERRUPT_COUNT);
        debug!("Interrupt count: {} (reset: {})", count, reset);
        Ok(count)
    }
}
