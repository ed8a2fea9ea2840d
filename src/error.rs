use crate::consts::status;
use thiserror::Error;

/// Errors that can occur when driving the MCP2210 and the devices behind it.
///
/// The variants fall into four groups:
///
/// * validation errors, raised before any USB traffic ([`Error::ArgumentOutOfRange`],
///   [`Error::InvalidSetting`], [`Error::InvalidAddress`], [`Error::OperationTooLarge`]);
/// * transport errors from the HID layer ([`Error::Hid`], [`Error::ShortWrite`],
///   [`Error::ShortRead`], [`Error::DeviceNotFound`]);
/// * protocol errors reported by the chip ([`Error::CommandFailed`],
///   [`Error::CommandEchoMismatch`], [`Error::InvalidReport`]);
/// * [`Error::TransferTimeout`], raised only by the SPI bulk transfer engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying HID API layer.
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// No MCP2210 was found with the specified vendor/product ID.
    #[error("Device not found with VID {vid:04X} / PID {pid:04X}")]
    DeviceNotFound {
        /// Vendor ID that was searched for.
        vid: u16,
        /// Product ID that was searched for.
        pid: u16,
    },
    /// The HID layer accepted fewer bytes than a full report.
    #[error("Incomplete HID write: {actual} of {expected} bytes")]
    ShortWrite {
        /// Bytes that should have been written.
        expected: usize,
        /// Bytes the HID layer reported as written.
        actual: usize,
    },
    /// The HID layer returned fewer bytes than a full report.
    #[error("Incomplete HID read: {actual} of {expected} bytes")]
    ShortRead {
        /// Bytes that should have been read.
        expected: usize,
        /// Bytes the HID layer returned.
        actual: usize,
    },
    /// The MCP2210 answered with a non-zero status byte.
    #[error("Command 0x{command:02X} failed with status 0x{status:02X} ({})", status_label(.status))]
    CommandFailed {
        /// Command code that was sent.
        command: u8,
        /// Raw status byte returned by the chip.
        status: u8,
    },
    /// The command code echoed by the MCP2210 was not the one sent to it.
    #[error("Command echo mismatch: sent 0x{sent:02X}, received 0x{received:02X}")]
    CommandEchoMismatch {
        /// Command code that was sent.
        sent: u8,
        /// Command code echoed back.
        received: u8,
    },
    /// A response carried a field that cannot be valid.
    #[error("Invalid report from device: {0}")]
    InvalidReport(String),
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// A configuration key/value could not be applied.
    #[error("Invalid setting [{section}] {key}: {message}")]
    InvalidSetting {
        /// Section (settings group) the key belongs to.
        section: String,
        /// Key within the section.
        key: String,
        /// Why the value was rejected.
        message: String,
    },
    /// A register or memory address is reserved or out of range.
    #[error("Invalid address 0x{address:X}: {message}")]
    InvalidAddress {
        /// The rejected address.
        address: u32,
        /// Which constraint it violates.
        message: String,
    },
    /// Requested operation exceeds device or protocol limits.
    #[error("Requested operation size is too large (max {max}, got {actual})")]
    OperationTooLarge {
        /// Maximum allowed size for this operation.
        max: usize,
        /// Actual size requested.
        actual: usize,
    },
    /// The SPI engine did not accept or finish a transfer within the retry budget.
    #[error("SPI transfer timed out after {attempts} attempts with {remaining} bytes left to send")]
    TransferTimeout {
        /// Exchanges performed before giving up.
        attempts: u32,
        /// Bytes still unsent when the budget ran out.
        remaining: usize,
    },
    /// Writing a DAC5687 register failed part way through a multi-register operation.
    #[error("DAC5687 register 0x{address:02X}: {source}")]
    Register {
        /// Register that was being written.
        address: u8,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for MCP2210 operations.
///
/// This is a convenience alias for `std::result::Result<T, Error>` used
/// throughout the crate to reduce boilerplate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Raw status byte, if this error came from a non-zero MCP2210 status.
    pub fn status(&self) -> Option<u8> {
        match self {
            Error::CommandFailed { status, .. } => Some(*status),
            Error::Register { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True for errors raised before any I/O because the input was invalid.
    pub fn is_validation(&self) -> bool {
        match self {
            Error::ArgumentOutOfRange(_)
            | Error::InvalidSetting { .. }
            | Error::InvalidAddress { .. }
            | Error::OperationTooLarge { .. } => true,
            Error::Register { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// True for failures of the HID channel itself.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Hid(_)
            | Error::ShortWrite { .. }
            | Error::ShortRead { .. }
            | Error::DeviceNotFound { .. } => true,
            Error::Register { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Human-readable name of a known MCP2210 status code.
pub fn status_name(code: u8) -> &'static str {
    match code {
        status::SUCCESS => "success",
        status::BUS_NOT_AVAILABLE => "SPI bus not available",
        status::TRANSFER_IN_PROGRESS => "transfer in progress, data not accepted",
        status::UNKNOWN_COMMAND => "unknown command",
        status::WRITE_FAILURE => "EEPROM write failure",
        status::ACCESS_REJECTED => "access rejected",
        status::ACCESS_LOCKED => "settings permanently locked",
        status::ACCESS_BLOCKED => "access blocked after failed password attempts",
        _ => "unknown status",
    }
}

fn status_label(code: &u8) -> &'static str {
    status_name(*code)
}

// Helpers for the common validation failures
pub(crate) fn invalid_setting(section: &str, key: &str, message: impl Into<String>) -> Error {
    Error::InvalidSetting {
        section: section.to_string(),
        key: key.to_string(),
        message: message.into(),
    }
}
pub(crate) fn invalid_address(address: u32, message: impl Into<String>) -> Error {
    Error::InvalidAddress {
        address,
        message: message.into(),
    }
}
