//! Loads a sample table into SRAM and reads the first words back.
//!
//! Usage: `cargo run --example sram_readback -- samples.csv`
//!
//! Rows are either `address,word` or seven hex bytes as written by the
//! sample generator.

use dds_host::{Mcp2210, SramAdapter};
use hidapi::HidApi;
use std::{env, fs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let path = env::args().nth(1).ok_or("usage: sram_readback <csv file>")?;
    let rows: Vec<Vec<String>> = fs::read_to_string(&path)?
        .lines()
        .map(|line| line.split(',').map(|cell| cell.trim().to_string()).collect())
        .collect();

    let hid_api = HidApi::new()?;
    let mut device = Mcp2210::open_first(&hid_api)?;
    let mut sram = SramAdapter::new(&mut device);
    sram.configure_pins()?;

    let written = sram.load(&rows)?;
    println!("Wrote {} words from {}", written, path);

    for address in 0..written.min(8) as u32 {
        println!("SRAM[{:6}] = 0x{:08X}", address, sram.read_word(address)?);
    }
    Ok(())
}
