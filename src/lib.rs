//! # dds-host
//!
//! A Rust crate for driving a direct digital synthesis board from a host PC
//! through a Microchip MCP2210 USB-to-SPI bridge, using its USB HID interface.
//!
//! This crate uses the `hidapi` crate for cross-platform USB HID communication.
//!
//! ## Features
//!
//! *   Device discovery (`find_all`, `find_devices`).
//! *   Flexible device opening (`open`, `open_first`, `open_by_vid_pid`, `open_by_path`).
//! *   MCP2210 command set:
//!     *   SPI transfer settings, current and power-up (`read_spi_settings`, `write_spi_settings`).
//!     *   Chip settings: pin designations, GPIO defaults, interrupt mode, access control.
//!     *   Bulk SPI transfers of up to 65535 bytes (`spi_transfer`, `spi_transfer_with`),
//!         split into 60-byte chunks and retried while the bus is busy.
//!     *   GPIO values and directions, per pin (`GpioPin`) or as 9-bit masks.
//!     *   EEPROM, interrupt counter, chip status, bus release, cancel, password.
//!     *   USB key parameters and manufacturer/product strings.
//! *   DAC5687 register access and full configuration (`Dac5687`, `ConverterSettings`).
//! *   SRAM word access through the CPLD adapter, and loading sample tables (`SramAdapter`).
//! *   `[section] key = value` settings application for the bridge
//!     (`BridgeSettings::apply_setting`) and the converter (`ConverterSettings::apply_setting`).
//! *   A `HidChannel` trait so the protocol layers run against any report transport.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use dds_host::{ConverterSettings, Dac5687, Mcp2210, Result, SramAdapter};
//! use hidapi::HidApi;
//!
//! fn main() -> Result<()> {
//!     // Optional: Initialize logging
//!     // env_logger::init();
//!
//!     let hid_api = HidApi::new()?;
//!     let mut bridge = Mcp2210::open_first(&hid_api)?;
//!     println!("Opened: {:?}", bridge.get_device_info());
//!
//!     let mut settings = ConverterSettings::default();
//!     settings.apply_setting("CONFIG0", "interp", "x4")?;
//!     settings.apply_setting("NCO", "frequency", "0x10000000")?;
//!     Dac5687::new(&mut bridge).configure(&settings)?;
//!
//!     let mut sram = SramAdapter::new(&mut bridge);
//!     sram.write_word(0, 0x7FFF_8001)?;
//!     println!("SRAM[0] = 0x{:08X}", sram.read_word(0)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Working with Multiple Devices / Custom IDs
//!
//! If several bridges are connected, or the USB key parameters were changed,
//! use `find_devices` and `Mcp2210::open`:
//!
//! 1.  **Find Devices:** Call `dds_host::find_devices(&hid_api, vid, pid_option)`.
//! 2.  **Select Device:** Iterate the returned `Vec<DeviceInfo>` and choose by `serial_number` or `path`.
//! 3.  **Open Device:** Call `dds_host::Mcp2210::open(&hid_api, &selected_device_info)`.
//!
//! See the `demos/list_devices.rs` example.
//!
//! ## Hardware Setup Notes
//!
//! *   **Chip selects:** GP0 selects the DAC5687, GP1 selects the CPLD SRAM adapter.
//! *   **Linux udev Rules:** Grant user permission to the HID device. Create `/etc/udev/rules.d/99-mcp2210.rules`:
//!     ```udev
//!     SUBSYSTEM=="hidraw", ATTRS{idVendor}=="04d8", ATTRS{idProduct}=="00de", MODE="0666", GROUP="plugdev"
//!     ```
//!     Reload: `sudo udevadm control --reload-rules && sudo udevadm trigger`
//! *   **Only one transfer at a time:** the bridge has a single SPI engine. The
//!     handle is `&mut self` throughout, so a shared handle needs external locking.

mod consts;
pub mod dac5687;
mod device;
mod error;
pub mod fields;
pub mod gpio;
pub mod report;
pub mod settings;
pub mod sram;
pub mod transport;

mod chip;
mod spi;
mod usb;

pub use consts::{MCP2210_PID, MICROCHIP_VID};
pub use dac5687::{ConverterSettings, Dac5687};
pub use device::{find_all, find_devices, DeviceDetails, DeviceInfo, Mcp2210};
pub use error::{status_name, Error, Result};
pub use gpio::{GpioDirection, GpioLevel, GpioPin};
pub use report::{Command, NvramSection, Report};
pub use settings::{
    AccessControl, BridgeSettings, BusOwner, ChipSettings, ChipStatus, InterruptMode, Password,
    PinDesignation, PowerOption, SettingsTarget, SpiMode, SpiTransferSettings, UsbKeySettings,
};
pub use sram::{CellSource, MemoryWord, SramAdapter};
pub use transport::{HidChannel, HidTransport, TransferConfig};

/// Raw status codes returned in byte 1 of every response.
pub mod status {
    pub use crate::consts::status::*;
}
