use dds_host::{self, Mcp2210, Result};
use hidapi::HidApi;

fn main() -> Result<()> {
    env_logger::init();
    let hid_api = HidApi::new()?;

    println!(
        "Searching for MCP2210 devices (VID=0x{:04X}, PID=0x{:04X})...",
        dds_host::MICROCHIP_VID,
        dds_host::MCP2210_PID
    );
    let devices = dds_host::find_all(&hid_api);

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("Found {} device(s):", devices.len());
    for (i, info) in devices.iter().enumerate() {
        println!(
            "  {}: VID=0x{:04X}, PID=0x{:04X}, Interface={}, Path={:?}, Serial='{}', Product='{}'",
            i,
            info.vid,
            info.pid,
            info.interface_number,
            info.path,
            info.serial_number.as_deref().unwrap_or("N/A"),
            info.product_string.as_deref().unwrap_or("N/A"),
        );
    }

    // --- Open the first one and dump its state ---
    let mut device = Mcp2210::open(&hid_api, &devices[0])?;
    println!("\nOpened: {:?}", device.get_device_info());
    println!("Manufacturer: {}", device.read_manufacturer_name()?);
    println!("Product:      {}", device.read_product_name()?);
    println!("USB key:      {:?}", device.read_usb_key_settings()?);
    println!("Chip status:  {:?}", device.chip_status()?);
    for target in [
        dds_host::SettingsTarget::Current,
        dds_host::SettingsTarget::PowerUp,
    ] {
        println!("\n{:?} SPI settings:  {:?}", target, device.read_spi_settings(target)?);
        println!("{:?} chip settings: {:?}", target, device.read_chip_settings(target)?);
    }
    println!(
        "\nGPIO values 0x{:03X}, directions 0x{:03X}",
        device.read_gpio_values()?,
        device.read_gpio_directions()?
    );
    Ok(())
}
