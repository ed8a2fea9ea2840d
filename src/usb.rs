//! USB key parameters and the manufacturer/product descriptor strings.
//!
//! These live only in NVRAM and take effect at the next enumeration.

use crate::consts::{offsets, usb};
use crate::device::Mcp2210;
use crate::error::{Error, Result};
use crate::report::{Command, NvramSection, Report};
use crate::settings::UsbKeySettings;
use crate::transport::HidChannel;
use log::debug;

/// Encodes `text` as a USB string descriptor into a Set NVRAM report.
fn encode_string(report: &mut Report, text: &str) -> Result<()> {
    let units: Vec<u16> = text.encode_utf16().collect();
    if units.len() > usb::MAX_STRING_UNITS {
        return Err(Error::ArgumentOutOfRange(format!(
            "USB string is {} UTF-16 units, at most {} allowed",
            units.len(),
            usb::MAX_STRING_UNITS
        )));
    }
    report.set_u8(offsets::STRING_LEN, (units.len() * 2 + 2) as u8);
    report.set_u8(offsets::STRING_TYPE, usb::STRING_DESCRIPTOR_TYPE);
    for (i, unit) in units.iter().enumerate() {
        report.set_u16(offsets::STRING_DATA + 2 * i, *unit);
    }
    Ok(())
}

/// Decodes the USB string descriptor in a Get NVRAM response.
fn decode_string(report: &Report) -> Result<String> {
    let len = usize::from(report.u8_at(offsets::STRING_LEN));
    if len < 2 || len % 2 != 0 || (len - 2) / 2 > usb::MAX_STRING_UNITS {
        return Err(Error::InvalidReport(format!(
            "USB string descriptor length {}",
            len
        )));
    }
    let units: Vec<u16> = (0..(len - 2) / 2)
        .map(|i| report.u16_at(offsets::STRING_DATA + 2 * i))
        .collect();
    String::from_utf16(&units)
        .map_err(|_| Error::InvalidReport("USB string is not valid UTF-16".to_string()))
}

impl<C: HidChannel> Mcp2210<C> {
    // --- USB Key Settings ---

    pub fn read_usb_key_settings(&mut self) -> Result<UsbKeySettings> {
        let response = self.transfer(&Report::new(Command::GetNvram(NvramSection::UsbKey)))?;
        let settings = UsbKeySettings::decode(&response);
        debug!("Read USB key settings: {:?}", settings);
        Ok(settings)
    }

    pub fn write_usb_key_settings(&mut self, settings: &UsbKeySettings) -> Result<()> {
        let mut request = Report::new(Command::SetNvram(NvramSection::UsbKey));
        settings.encode_into(&mut request)?;
        debug!("Writing USB key settings: {:?}", settings);
        self.transfer(&request)?;
        Ok(())
    }

    // --- Descriptor Strings ---

    pub fn read_manufacturer_name(&mut self) -> Result<String> {
        self.read_descriptor_string(NvramSection::ManufacturerName)
    }

    /// Sets the manufacturer string (at most 29 UTF-16 code units).
    pub fn write_manufacturer_name(&mut self, name: &str) -> Result<()> {
        self.write_descriptor_string(NvramSection::ManufacturerName, name)
    }

    pub fn read_product_name(&mut self) -> Result<String> {
        self.read_descriptor_string(NvramSection::ProductName)
    }

    /// Sets the product string (at most 29 UTF-16 code units).
    pub fn write_product_name(&mut self, name: &str) -> Result<()> {
        self.write_descriptor_string(NvramSection::ProductName, name)
    }

    fn read_descriptor_string(&mut self, section: NvramSection) -> Result<String> {
        let response = self.transfer(&Report::new(Command::GetNvram(section)))?;
        let text = decode_string(&response)?;
        debug!("Read {:?}: {:?}", section, text);
        Ok(text)
    }

    fn write_descriptor_string(&mut self, section: NvramSection, text: &str) -> Result<()> {
        let mut request = Report::new(Command::SetNvram(section));
        encode_string(&mut request, text)?;
        debug!("Writing {:?}: {:?}", section, text);
        self.transfer(&request)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_descriptor_layout() {
        let mut report = Report::new(Command::SetNvram(NvramSection::ProductName));
        encode_string(&mut report, "DDS").unwrap();
        assert_eq!(
            &report.as_bytes()[..12],
            &[0x60, 0x40, 0x00, 0x00, 0x08, 0x03, b'D', 0x00, b'D', 0x00, b'S', 0x00]
        );
        assert_eq!(decode_string(&report).unwrap(), "DDS");
    }

    #[test]
    fn test_string_length_limit() {
        let mut report = Report::new(Command::SetNvram(NvramSection::ProductName));
        assert!(encode_string(&mut report, &"x".repeat(29)).is_ok());
        assert_eq!(report.u8_at(4), 60);
        let err = encode_string(&mut report, &"x".repeat(30)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_empty_string() {
        let mut report = Report::new(Command::SetNvram(NvramSection::ManufacturerName));
        encode_string(&mut report, "").unwrap();
        assert_eq!(report.u8_at(4), 2);
        assert_eq!(decode_string(&report).unwrap(), "");
    }
}
