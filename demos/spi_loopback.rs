//! Clocks a test pattern through the SPI bus. With MOSI wired to MISO the
//! received bytes match the sent ones.

use dds_host::{Mcp2210, Result, SettingsTarget, SpiMode, TransferConfig};
use hidapi::HidApi;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();
    let hid_api = HidApi::new()?;
    let mut device = Mcp2210::open_first(&hid_api)?;
    device.set_transfer_config(TransferConfig::default().with_max_attempts(5000));

    let mut settings = device.read_spi_settings(SettingsTarget::Current)?;
    settings.bit_rate = 1_000_000;
    settings.mode = SpiMode::Mode0;
    // No chip select asserted.
    settings.idle_cs = 0x01FF;
    settings.active_cs = 0x01FF;

    for len in [1usize, 60, 61, 1000] {
        let tx: Vec<u8> = (0..len).map(|i| (i * 31 + 7) as u8).collect();
        let start = Instant::now();
        let rx = device.spi_transfer_with(&mut settings, &tx)?;
        let matched = rx.iter().zip(&tx).filter(|(a, b)| a == b).count();
        println!(
            "{:5} bytes in {:?}: received {}, {} match",
            len,
            start.elapsed(),
            rx.len(),
            matched
        );
    }
    Ok(())
}
