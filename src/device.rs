//! Device discovery and the MCP2210 handle.

use crate::consts::{self, status};
use crate::error::{Error, Result};
use crate::report::Report;
use crate::transport::{self, HidChannel, HidTransport, TransferConfig};
use hidapi::HidApi;
use log::{debug, trace, warn};
use std::ffi::{CStr, CString};

/// Information about a discovered MCP2210 HID interface.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// USB vendor ID (0x04D8 for Microchip unless reprogrammed).
    pub vid: u16,
    /// USB product ID (0x00DE unless reprogrammed).
    pub pid: u16,
    /// Platform-specific path used to open the interface.
    pub path: CString,
    pub serial_number: Option<String>,
    pub product_string: Option<String>,
    pub manufacturer_string: Option<String>,
    pub interface_number: i32,
}

/// Strings reported by an opened device.
#[derive(Debug, Clone, Default)]
pub struct DeviceDetails {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub product_string: Option<String>,
    pub manufacturer_string: Option<String>,
}

/// Lists HID interfaces matching `vid` and, if given, `pid`, ordered by serial number.
///
/// Use this for boards with a reprogrammed USB key, or to pick one of several
/// bridges before calling [`Mcp2210::open`].
pub fn find_devices(hid_api: &HidApi, vid: u16, pid: Option<u16>) -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = hid_api
        .device_list()
        .filter(|info| {
            info.vendor_id() == vid && pid.map_or(true, |p| info.product_id() == p)
        })
        .map(|info| {
            debug!(
                "Found MCP2210 interface: VID={:04X}, PID={:04X}, Path={:?}, SN={:?}",
                info.vendor_id(),
                info.product_id(),
                info.path(),
                info.serial_number()
            );
            DeviceInfo {
                vid: info.vendor_id(),
                pid: info.product_id(),
                path: info.path().to_owned(),
                serial_number: info.serial_number().map(|s| s.to_string()),
                product_string: info.product_string().map(|s| s.to_string()),
                manufacturer_string: info.manufacturer_string().map(|s| s.to_string()),
                interface_number: info.interface_number(),
            }
        })
        .collect();

    // Devices with a serial number come first, in serial order.
    devices.sort_by(|a, b| match (&a.serial_number, &b.serial_number) {
        (Some(a_serial), Some(b_serial)) => a_serial.cmp(b_serial),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    devices
}

/// Finds all MCP2210s with the factory VID/PID.
pub fn find_all(hid_api: &HidApi) -> Vec<DeviceInfo> {
    find_devices(hid_api, consts::MICROCHIP_VID, Some(consts::MCP2210_PID))
}

/// A handle to an opened MCP2210.
///
/// Every operation takes `&mut self`: the bridge runs one command at a time
/// and a bulk SPI transfer must not be interleaved with other commands.
/// The channel type defaults to the `hidapi` transport; tests plug in their
/// own [`HidChannel`].
#[derive(Debug)]
pub struct Mcp2210<C: HidChannel = HidTransport> {
    pub(crate) channel: C,
    pub(crate) config: TransferConfig,
    pub(crate) info: DeviceDetails,
}

impl Mcp2210<HidTransport> {
    // --- Constructors ---

    /// Opens a device using its discovery info. Recommended method.
    pub fn open(hid_api: &HidApi, info: &DeviceInfo) -> Result<Self> {
        Self::open_by_path(hid_api, &info.path)
    }

    /// Opens the first MCP2210 with the factory VID/PID.
    /// **Warning:** Ambiguous if multiple devices exist.
    pub fn open_first(hid_api: &HidApi) -> Result<Self> {
        let info = find_all(hid_api)
            .into_iter()
            .next()
            .ok_or(Error::DeviceNotFound {
                vid: consts::MICROCHIP_VID,
                pid: consts::MCP2210_PID,
            })?;
        Self::open(hid_api, &info)
    }

    /// Opens a device by its Vendor ID and Product ID.
    /// **Warning:** Ambiguous if multiple devices match.
    pub fn open_by_vid_pid(hid_api: &HidApi, vid: u16, pid: u16) -> Result<Self> {
        let device = hid_api.open(vid, pid).map_err(|e| {
            debug!("Opening {:04X}:{:04X} failed: {}", vid, pid, e);
            Error::DeviceNotFound { vid, pid }
        })?;
        Self::from_hid_device(device)
    }

    /// Opens a device by its platform-specific path.
    pub fn open_by_path(hid_api: &HidApi, path: &CStr) -> Result<Self> {
        let device = hid_api.open_path(path)?;
        Self::from_hid_device(device)
    }

    /// Wraps an already opened `hidapi` device.
    pub fn from_hid_device(device: hidapi::HidDevice) -> Result<Self> {
        let hid_info = device.get_device_info()?;
        let info = DeviceDetails {
            vendor_id: hid_info.vendor_id(),
            product_id: hid_info.product_id(),
            serial_number: device.get_serial_number_string()?,
            product_string: device.get_product_string()?,
            manufacturer_string: device.get_manufacturer_string()?,
        };
        debug!(
            "Opened MCP2210: VID={:04X}, PID={:04X}, SN={:?}",
            info.vendor_id, info.product_id, info.serial_number
        );
        let mut handle = Self::from_channel(HidTransport::new(device));
        handle.info = info;
        Ok(handle)
    }
}

impl<C: HidChannel> Mcp2210<C> {
    /// Builds a handle around any [`HidChannel`] with the default [`TransferConfig`].
    pub fn from_channel(channel: C) -> Self {
        let config = TransferConfig::default();
        let mut handle = Mcp2210 {
            channel,
            config,
            info: DeviceDetails::default(),
        };
        handle.channel.set_read_timeout(config.read_timeout_ms);
        handle
    }

    /// Identification strings captured when the device was opened.
    pub fn get_device_info(&self) -> &DeviceDetails {
        &self.info
    }

    pub fn transfer_config(&self) -> TransferConfig {
        self.config
    }

    pub fn set_transfer_config(&mut self, config: TransferConfig) {
        debug!("Transfer config: {:?}", config);
        self.channel.set_read_timeout(config.read_timeout_ms);
        self.config = config;
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    // --- Report Exchange ---

    /// Sends one command report and checks the echoed command and status byte.
    pub fn transfer(&mut self, request: &Report) -> Result<Report> {
        let response = self.exchange_raw(request)?;
        let (command, code) = response.decode_status();
        if code != status::SUCCESS {
            warn!(
                "Command 0x{:02X} failed: status 0x{:02X} ({})",
                command,
                code,
                crate::error::status_name(code)
            );
            return Err(Error::CommandFailed {
                command,
                status: code,
            });
        }
        Ok(response)
    }

    /// Sends one command report and checks only the echoed command.
    /// The caller interprets the status byte.
    pub fn exchange_raw(&mut self, request: &Report) -> Result<Report> {
        let response = transport::exchange(&mut self.channel, request)?;
        if response.command() != request.command() {
            warn!(
                "Command echo mismatch: sent 0x{:02X}, got 0x{:02X}",
                request.command(),
                response.command()
            );
            return Err(Error::CommandEchoMismatch {
                sent: request.command(),
                received: response.command(),
            });
        }
        trace!(
            "Command 0x{:02X} -> status 0x{:02X}",
            response.command(),
            response.status()
        );
        Ok(response)
    }
}
