//! Applies a `[section] key = value` settings file and configures the DAC5687.
//!
//! Usage: `cargo run --example configure_dac -- settings.ini`
//!
//! `SPI`, `USB` and `CHIP` sections are applied on top of the bridge's
//! current settings; every other section goes to the converter. A bridge
//! family is written back only when the file names it.

use dds_host::{
    dac5687::registers, BridgeSettings, ConverterSettings, Dac5687, Mcp2210, SettingsTarget,
};
use hidapi::HidApi;
use std::{env, fs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let path = env::args().nth(1).ok_or("usage: configure_dac <settings file>")?;
    let text = fs::read_to_string(&path)?;

    let mut bridge_entries = Vec::new();
    let mut converter = ConverterSettings::default();
    let mut section = String::new();
    for line in text.lines() {
        let line = line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            eprintln!("Skipping malformed line: {}", line);
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match section.to_ascii_uppercase().as_str() {
            "SPI" | "USB" | "CHIP" => {
                bridge_entries.push((section.clone(), key.to_string(), value.to_string()))
            }
            _ => converter.apply_setting(&section, key, value)?,
        }
    }
    println!("Converter settings: {:#?}", converter);

    let hid_api = HidApi::new()?;
    let mut device = Mcp2210::open_first(&hid_api)?;

    let current = BridgeSettings {
        spi: device.read_spi_settings(SettingsTarget::Current)?,
        chip: device.read_chip_settings(SettingsTarget::Current)?,
        usb: device.read_usb_key_settings()?,
    };
    let mut bridge = current;
    for (section, key, value) in &bridge_entries {
        bridge.apply_setting(section, key, value)?;
    }
    if bridge.spi != current.spi {
        device.write_spi_settings(SettingsTarget::Current, &bridge.spi)?;
    }
    if bridge.chip != current.chip {
        device.write_chip_settings(SettingsTarget::Current, &bridge.chip)?;
    }
    if bridge.usb != current.usb {
        println!("Writing USB key settings to NVRAM");
        device.write_usb_key_settings(&bridge.usb)?;
    }

    let mut dac = Dac5687::new(&mut device);
    dac.configure(&converter)?;
    let version = dac.read_register(registers::VERSION)?;
    println!("DAC5687 configured, VERSION register = 0x{:02X}", version);
    Ok(())
}
