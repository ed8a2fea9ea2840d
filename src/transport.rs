//! Blocking HID channel abstraction and the single 64-byte exchange.

use crate::consts::{spi, REPORT_LEN};
use crate::error::{Error, Result};
use crate::report::Report;
use hidapi::HidDevice;
use log::{trace, warn};

/// A blocking HID endpoint that moves whole reports.
///
/// `write` takes a report without the HID report ID and returns how many of
/// its bytes were sent. `read` fills `buf` and returns the number of bytes
/// received (0 on timeout).
pub trait HidChannel {
    fn write(&mut self, data: &[u8]) -> Result<usize>;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Updates the read timeout, in milliseconds (-1 blocks).
    fn set_read_timeout(&mut self, _timeout_ms: i32) {}
}

/// [`HidChannel`] over a `hidapi` device handle.
#[derive(Debug)]
pub struct HidTransport {
    device: HidDevice,
    read_timeout_ms: i32,
}

impl HidTransport {
    pub fn new(device: HidDevice) -> Self {
        HidTransport {
            device,
            read_timeout_ms: spi::DEFAULT_READ_TIMEOUT_MS,
        }
    }

    pub fn device(&self) -> &HidDevice {
        &self.device
    }
}

impl HidChannel for HidTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        // The MCP2210 uses unnumbered reports: report ID 0 goes first.
        let mut buf = Vec::with_capacity(data.len() + 1);
        buf.push(0x00);
        buf.extend_from_slice(data);
        let written = self.device.write(&buf)?;
        Ok(written.saturating_sub(1).min(data.len()))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.device.read_timeout(buf, self.read_timeout_ms)?)
    }

    fn set_read_timeout(&mut self, timeout_ms: i32) {
        self.read_timeout_ms = timeout_ms;
    }
}

/// Runtime knobs for device I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Report exchanges a bulk SPI transfer may perform before giving up.
    pub max_attempts: u32,
    /// HID read timeout in milliseconds (-1 blocks forever).
    pub read_timeout_ms: i32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            max_attempts: spi::DEFAULT_MAX_ATTEMPTS,
            read_timeout_ms: spi::DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl TransferConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_read_timeout_ms(mut self, read_timeout_ms: i32) -> Self {
        self.read_timeout_ms = read_timeout_ms;
        self
    }
}

/// Writes one full report and reads one full report back. No retries.
pub fn exchange<C: HidChannel + ?Sized>(channel: &mut C, request: &Report) -> Result<Report> {
    trace!("HID write: {:?}", request);
    let written = channel.write(request.as_bytes())?;
    if written != REPORT_LEN {
        warn!("HID write sent {} of {} bytes", written, REPORT_LEN);
        return Err(Error::ShortWrite {
            expected: REPORT_LEN,
            actual: written,
        });
    }

    let mut buf = [0u8; REPORT_LEN];
    let read = channel.read(&mut buf)?;
    if read != REPORT_LEN {
        warn!("HID read returned {} of {} bytes", read, REPORT_LEN);
        return Err(Error::ShortRead {
            expected: REPORT_LEN,
            actual: read,
        });
    }
    let response = Report::from_bytes(buf);
    trace!("HID read: {:?}", response);
    Ok(response)
}
