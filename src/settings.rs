//! Typed MCP2210 settings and their report layouts.
//!
//! Each settings family knows how to place itself into a command payload and
//! how to read itself back from a response. The same layout is used for the
//! current (volatile) settings and the power-up (NVRAM) settings, apart from
//! the USB key parameters which only exist in NVRAM and are laid out
//! differently in the two directions.

use crate::consts::{chip, offsets, usb, GPIO_COUNT, GPIO_MASK};
use crate::error::{Error, Result};
use crate::report::{Command, NvramSection, Report};
use bit_field::BitField;

/// Which copy of a settings family an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsTarget {
    /// Volatile settings in effect now, lost on reset.
    Current,
    /// Settings loaded at power-up (NVRAM).
    PowerUp,
}

impl SettingsTarget {
    pub(crate) fn get_command(self, current: Command, section: NvramSection) -> Command {
        match self {
            SettingsTarget::Current => current,
            SettingsTarget::PowerUp => Command::GetNvram(section),
        }
    }

    pub(crate) fn set_command(self, current: Command, section: NvramSection) -> Command {
        match self {
            SettingsTarget::Current => current,
            SettingsTarget::PowerUp => Command::SetNvram(section),
        }
    }
}

// --- SPI Transfer Settings ---

/// SPI clock polarity / phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpiMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl SpiMode {
    pub fn bits(self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(SpiMode::Mode0),
            1 => Some(SpiMode::Mode1),
            2 => Some(SpiMode::Mode2),
            3 => Some(SpiMode::Mode3),
            _ => None,
        }
    }
}

/// SPI transfer parameters (17 payload bytes).
///
/// Chip-select values are GP0-GP8 bit masks. Delays are in the chip's
/// 100 µs units, exactly as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpiTransferSettings {
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    pub idle_cs: u16,
    pub active_cs: u16,
    pub cs_to_data_delay: u16,
    pub last_data_to_cs_delay: u16,
    pub data_to_data_delay: u16,
    pub bytes_per_transaction: u16,
    pub mode: SpiMode,
}

impl SpiTransferSettings {
    pub(crate) fn encode_into(&self, report: &mut Report) {
        report.set_u32(4, self.bit_rate);
        report.set_u16(8, self.idle_cs & GPIO_MASK);
        report.set_u16(10, self.active_cs & GPIO_MASK);
        report.set_u16(12, self.cs_to_data_delay);
        report.set_u16(14, self.last_data_to_cs_delay);
        report.set_u16(16, self.data_to_data_delay);
        report.set_u16(18, self.bytes_per_transaction);
        report.set_u8(20, self.mode.bits());
    }

    pub(crate) fn decode(report: &Report) -> Result<Self> {
        let mode = report.u8_at(20);
        Ok(SpiTransferSettings {
            bit_rate: report.u32_at(4),
            idle_cs: report.u16_at(8) & GPIO_MASK,
            active_cs: report.u16_at(10) & GPIO_MASK,
            cs_to_data_delay: report.u16_at(12),
            last_data_to_cs_delay: report.u16_at(14),
            data_to_data_delay: report.u16_at(16),
            bytes_per_transaction: report.u16_at(18),
            mode: SpiMode::from_bits(mode)
                .ok_or_else(|| Error::InvalidReport(format!("SPI mode {}", mode)))?,
        })
    }
}

// --- Chip Settings ---

/// Function assigned to a GP pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PinDesignation {
    #[default]
    Gpio,
    ChipSelect,
    /// The pin's dedicated function (LED, interrupt input, bus release...).
    Dedicated,
}

impl PinDesignation {
    pub fn code(self) -> u8 {
        match self {
            PinDesignation::Gpio => 0x00,
            PinDesignation::ChipSelect => 0x01,
            PinDesignation::Dedicated => 0x02,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(PinDesignation::Gpio),
            0x01 => Some(PinDesignation::ChipSelect),
            0x02 => Some(PinDesignation::Dedicated),
            _ => None,
        }
    }
}

/// Edge/pulse counting mode of the GP6 interrupt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterruptMode {
    #[default]
    None,
    FallingEdges,
    RisingEdges,
    LowPulses,
    HighPulses,
}

impl InterruptMode {
    pub fn bits(self) -> u8 {
        match self {
            InterruptMode::None => 0b000,
            InterruptMode::FallingEdges => 0b001,
            InterruptMode::RisingEdges => 0b010,
            InterruptMode::LowPulses => 0b011,
            InterruptMode::HighPulses => 0b100,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(InterruptMode::None),
            0b001 => Some(InterruptMode::FallingEdges),
            0b010 => Some(InterruptMode::RisingEdges),
            0b011 => Some(InterruptMode::LowPulses),
            0b100 => Some(InterruptMode::HighPulses),
            _ => None,
        }
    }
}

/// NVRAM protection level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessControl {
    #[default]
    Unprotected,
    /// Changes require the password.
    Protected,
    /// Settings can never be changed again.
    Locked,
}

impl AccessControl {
    pub fn code(self) -> u8 {
        match self {
            AccessControl::Unprotected => chip::ACCESS_UNPROTECTED,
            AccessControl::Protected => chip::ACCESS_PROTECTED,
            AccessControl::Locked => chip::ACCESS_LOCKED,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            chip::ACCESS_UNPROTECTED => Some(AccessControl::Unprotected),
            chip::ACCESS_PROTECTED => Some(AccessControl::Protected),
            chip::ACCESS_LOCKED => Some(AccessControl::Locked),
            _ => None,
        }
    }
}

/// NVRAM access password: up to 8 ASCII characters, zero padded on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Password([u8; chip::PASSWORD_LEN]);

impl Password {
    pub fn new(text: &str) -> Result<Self> {
        if !text.is_ascii() {
            return Err(Error::ArgumentOutOfRange(
                "Password must be ASCII".to_string(),
            ));
        }
        if text.len() > chip::PASSWORD_LEN {
            return Err(Error::ArgumentOutOfRange(format!(
                "Password is {} characters, at most {} allowed",
                text.len(),
                chip::PASSWORD_LEN
            )));
        }
        let mut bytes = [0u8; chip::PASSWORD_LEN];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        Ok(Password(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; chip::PASSWORD_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(********)")
    }
}

/// Chip settings: pin functions, GPIO defaults, interrupt mode and protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipSettings {
    /// Designation of GP0-GP8.
    pub pins: [PinDesignation; GPIO_COUNT],
    /// Default GPIO output levels (bit n = GPn).
    pub default_output: u16,
    /// Default GPIO directions (bit n = GPn, 1 = input).
    pub default_direction: u16,
    pub remote_wakeup: bool,
    pub interrupt_mode: InterruptMode,
    /// Raw SPI bus release bit (bit 0 of the flags byte).
    pub spi_bus_release: bool,
    pub access_control: AccessControl,
    /// New password, sent only with power-up writes. Never read back.
    pub password: Option<Password>,
}

impl ChipSettings {
    pub(crate) fn encode_into(&self, report: &mut Report, target: SettingsTarget) {
        for (i, pin) in self.pins.iter().enumerate() {
            report.set_u8(4 + i, pin.code());
        }
        report.set_u16(13, self.default_output & GPIO_MASK);
        report.set_u16(15, self.default_direction & GPIO_MASK);

        let mut flags = 0u8;
        flags.set_bit(chip::REMOTE_WAKEUP_BIT, self.remote_wakeup);
        flags.set_bits(chip::INTERRUPT_MODE_BITS, self.interrupt_mode.bits());
        flags.set_bit(chip::SPI_BUS_RELEASE_BIT, self.spi_bus_release);
        report.set_u8(17, flags);

        report.set_u8(18, self.access_control.code());
        if target == SettingsTarget::PowerUp {
            if let Some(password) = &self.password {
                report.set_bytes(19, password.as_bytes());
            }
        }
    }

    pub(crate) fn decode(report: &Report) -> Result<Self> {
        let mut pins = [PinDesignation::Gpio; GPIO_COUNT];
        for (i, pin) in pins.iter_mut().enumerate() {
            let code = report.u8_at(4 + i);
            *pin = PinDesignation::from_code(code).ok_or_else(|| {
                Error::InvalidReport(format!("GP{} designation 0x{:02X}", i, code))
            })?;
        }
        let flags = report.u8_at(17);
        let interrupt_bits = flags.get_bits(chip::INTERRUPT_MODE_BITS);
        let access = report.u8_at(18);
        Ok(ChipSettings {
            pins,
            default_output: report.u16_at(13) & GPIO_MASK,
            default_direction: report.u16_at(15) & GPIO_MASK,
            remote_wakeup: flags.get_bit(chip::REMOTE_WAKEUP_BIT),
            interrupt_mode: InterruptMode::from_bits(interrupt_bits).ok_or_else(|| {
                Error::InvalidReport(format!("interrupt mode 0b{:03b}", interrupt_bits))
            })?,
            spi_bus_release: flags.get_bit(chip::SPI_BUS_RELEASE_BIT),
            access_control: AccessControl::from_code(access).ok_or_else(|| {
                Error::InvalidReport(format!("access control 0x{:02X}", access))
            })?,
            password: None,
        })
    }
}

// --- USB Key Settings ---

/// USB power attributes byte of the configuration descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PowerOption(pub u8);

impl PowerOption {
    pub const HOST_POWERED: PowerOption = PowerOption(usb::POWER_HOST_POWERED);
    pub const SELF_POWERED: PowerOption = PowerOption(usb::POWER_SELF_POWERED);
    pub const REMOTE_WAKEUP: PowerOption = PowerOption(usb::POWER_REMOTE_WAKEUP);

    pub fn host_powered(self) -> bool {
        self.0.get_bit(7)
    }

    pub fn self_powered(self) -> bool {
        self.0.get_bit(6)
    }

    pub fn remote_wakeup(self) -> bool {
        self.0.get_bit(5)
    }
}

impl std::ops::BitOr for PowerOption {
    type Output = PowerOption;

    fn bitor(self, rhs: PowerOption) -> PowerOption {
        PowerOption(self.0 | rhs.0)
    }
}

/// USB identity and power request. Only stored in NVRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsbKeySettings {
    pub vid: u16,
    pub pid: u16,
    pub power: PowerOption,
    /// Requested bus current in mA. Even, at most 510.
    pub requested_current_ma: u16,
}

impl UsbKeySettings {
    pub fn validate(&self) -> Result<()> {
        if self.requested_current_ma > usb::MAX_REQUESTED_CURRENT_MA
            || self.requested_current_ma % 2 != 0
        {
            return Err(Error::ArgumentOutOfRange(format!(
                "Requested current {} mA must be even and at most {} mA",
                self.requested_current_ma,
                usb::MAX_REQUESTED_CURRENT_MA
            )));
        }
        Ok(())
    }

    pub(crate) fn encode_into(&self, report: &mut Report) -> Result<()> {
        self.validate()?;
        report.set_u16(offsets::USB_SET_VID, self.vid);
        report.set_u16(offsets::USB_SET_PID, self.pid);
        report.set_u8(offsets::USB_SET_POWER, self.power.0);
        report.set_u8(offsets::USB_SET_CURRENT, (self.requested_current_ma / 2) as u8);
        Ok(())
    }

    pub(crate) fn decode(report: &Report) -> Self {
        UsbKeySettings {
            vid: report.u16_at(offsets::USB_GET_VID),
            pid: report.u16_at(offsets::USB_GET_PID),
            power: PowerOption(report.u8_at(offsets::USB_GET_POWER)),
            requested_current_ma: u16::from(report.u8_at(offsets::USB_GET_CURRENT)) * 2,
        }
    }
}

// --- Chip Status ---

/// Current owner of the SPI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusOwner {
    None,
    /// The MCP2210 itself.
    Bridge,
    /// An external SPI master.
    External,
    Other(u8),
}

impl From<u8> for BusOwner {
    fn from(code: u8) -> Self {
        match code {
            0x00 => BusOwner::None,
            0x01 => BusOwner::Bridge,
            0x02 => BusOwner::External,
            other => BusOwner::Other(other),
        }
    }
}

/// Snapshot returned by Get Chip Status and Cancel SPI Transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipStatus {
    /// A bus release request is pending (external master asked for the bus).
    pub bus_release_pending: bool,
    pub bus_owner: BusOwner,
    /// Failed password attempts since power-up.
    pub password_attempts: u8,
    pub password_guessed: bool,
}

impl ChipStatus {
    pub(crate) fn decode(report: &Report) -> Self {
        ChipStatus {
            // 0x01 means no request, 0x00 a pending one.
            bus_release_pending: report.u8_at(offsets::STATUS_BUS_RELEASE) == 0x00,
            bus_owner: report.u8_at(offsets::STATUS_BUS_OWNER).into(),
            password_attempts: report.u8_at(offsets::STATUS_PASSWORD_ATTEMPTS),
            password_guessed: report.u8_at(offsets::STATUS_PASSWORD_GUESSED) != 0,
        }
    }
}

/// The three bridge settings families, as held by a configuration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeSettings {
    pub spi: SpiTransferSettings,
    pub chip: ChipSettings,
    pub usb: UsbKeySettings,
}

impl BridgeSettings {
    /// Applies one `[section] key = value` entry. See [`crate::fields`].
    pub fn apply_setting(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        crate::fields::apply(crate::fields::BRIDGE_FIELDS, self, section, key, value)
    }
}
