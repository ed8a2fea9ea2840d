//! Table-driven `[section] key = value` application.
//!
//! A settings family is described by a static slice of [`Field`]s. Each entry
//! names its section and key, the bit width the value must fit in, optional
//! symbolic names, and a setter. [`apply`] parses and range-checks the value
//! before the setter runs, so a rejected entry never modifies the target.
//!
//! Keys containing `#` are per-pin keys: `gp#_dir` matches `gp0_dir` through
//! `gp8_dir` and the setter receives the pin number.

use crate::consts::GPIO_COUNT;
use crate::error::{invalid_setting, Result};
use crate::settings::{
    AccessControl, BridgeSettings, InterruptMode, Password, PinDesignation, PowerOption, SpiMode,
};
use log::debug;

/// Setter invoked with an already range-checked value.
pub enum Setter<T> {
    Value(fn(&mut T, u64) -> std::result::Result<(), String>),
    Pin(fn(&mut T, usize, u64) -> std::result::Result<(), String>),
    Text(fn(&mut T, &str) -> std::result::Result<(), String>),
}

/// One settable key.
pub struct Field<T> {
    pub section: &'static str,
    pub key: &'static str,
    /// Bit width of the value (ignored for text fields).
    pub width: u32,
    /// Symbolic names accepted in place of a number.
    pub symbols: &'static [(&'static str, u64)],
    pub set: Setter<T>,
}

/// Parses `value` for `section`/`key` and stores it in `target`.
pub fn apply<T>(
    table: &[Field<T>],
    target: &mut T,
    section: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    if !table.iter().any(|f| f.section.eq_ignore_ascii_case(section)) {
        return Err(invalid_setting(section, key, "unknown section"));
    }
    let (field, pin) = table
        .iter()
        .filter(|f| f.section.eq_ignore_ascii_case(section))
        .find_map(|f| match_key(f.key, key).map(|pin| (f, pin)))
        .ok_or_else(|| invalid_setting(section, key, "unknown key"))?;

    let value = value.trim();
    let outcome = match &field.set {
        Setter::Text(set) => set(target, value),
        Setter::Value(set) => {
            let number = parse_value(value, field.symbols)
                .and_then(|n| check_width(n, field.width))
                .map_err(|msg| invalid_setting(section, key, msg))?;
            set(target, number)
        }
        Setter::Pin(set) => {
            let number = parse_value(value, field.symbols)
                .and_then(|n| check_width(n, field.width))
                .map_err(|msg| invalid_setting(section, key, msg))?;
            set(target, pin.unwrap_or(0), number)
        }
    };
    outcome.map_err(|msg| invalid_setting(section, key, msg))?;
    debug!("Applied [{}] {} = {}", field.section, key, value);
    Ok(())
}

/// Matches `key` against a table pattern. Returns `Some(Some(pin))` for a
/// per-pin match, `Some(None)` for a plain match.
fn match_key(pattern: &str, key: &str) -> Option<Option<usize>> {
    match pattern.split_once('#') {
        None => pattern.eq_ignore_ascii_case(key).then_some(None),
        Some((prefix, suffix)) => {
            if !key.is_ascii() || key.len() != prefix.len() + 1 + suffix.len() {
                return None;
            }
            let (head, rest) = key.split_at(prefix.len());
            let (digit, tail) = rest.split_at(1);
            if !head.eq_ignore_ascii_case(prefix) || !tail.eq_ignore_ascii_case(suffix) {
                return None;
            }
            let pin = digit.parse::<usize>().ok()?;
            (pin < GPIO_COUNT).then_some(Some(pin))
        }
    }
}

/// Parses a symbol, `true`/`false`, `0x` hex, `0b` binary or decimal number.
pub fn parse_value(text: &str, symbols: &[(&str, u64)]) -> std::result::Result<u64, String> {
    if let Some((_, v)) = symbols.iter().find(|(name, _)| name.eq_ignore_ascii_case(text)) {
        return Ok(*v);
    }
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let parsed = match lower.as_str() {
        "true" => Ok(1),
        "false" => Ok(0),
        s if s.starts_with("0x") => u64::from_str_radix(&s[2..], 16),
        s if s.starts_with("0b") => u64::from_str_radix(&s[2..], 2),
        s => s.parse::<u64>(),
    };
    parsed.map_err(|_| {
        if symbols.is_empty() {
            format!("'{}' is not a number", text)
        } else {
            let names: Vec<&str> = symbols.iter().map(|(n, _)| *n).collect();
            format!("'{}' is not a number or one of {}", text, names.join(", "))
        }
    })
}

fn check_width(value: u64, width: u32) -> std::result::Result<u64, String> {
    if width < 64 && value >> width != 0 {
        return Err(format!("{} does not fit in {} bits", value, width));
    }
    Ok(value)
}

fn set_mask_bit(mask: &mut u16, pin: usize, on: bool) {
    if on {
        *mask |= 1 << pin;
    } else {
        *mask &= !(1 << pin);
    }
}

// --- Bridge Settings Table ---

const SPI: &str = "SPI";
const USB: &str = "USB";
const CHIP: &str = "CHIP";

const SPI_MODES: &[(&str, u64)] = &[("mode0", 0), ("mode1", 1), ("mode2", 2), ("mode3", 3)];
const DESIGNATIONS: &[(&str, u64)] = &[("gpio", 0), ("cs", 1), ("chip_select", 1), ("dedicated", 2)];
const DIRECTIONS: &[(&str, u64)] = &[("output", 0), ("out", 0), ("input", 1), ("in", 1)];
const LEVELS: &[(&str, u64)] = &[("low", 0), ("high", 1)];
const INTERRUPT_MODES: &[(&str, u64)] = &[
    ("none", 0b000),
    ("falling", 0b001),
    ("rising", 0b010),
    ("low_pulses", 0b011),
    ("high_pulses", 0b100),
];
const ACCESS_MODES: &[(&str, u64)] = &[("unprotected", 0x00), ("protected", 0x40), ("locked", 0x80)];
const POWER_OPTIONS: &[(&str, u64)] = &[
    ("host_powered", 0x80),
    ("self_powered", 0x40),
    ("host_powered_remote_wakeup", 0xA0),
    ("self_powered_remote_wakeup", 0x60),
];

/// Keys of the `SPI`, `USB` and `CHIP` sections.
pub static BRIDGE_FIELDS: &[Field<BridgeSettings>] = &[
    // SPI
    Field {
        section: SPI,
        key: "bit_rate",
        width: 32,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.spi.bit_rate = v as u32;
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "cs_idle_#",
        width: 1,
        symbols: LEVELS,
        set: Setter::Pin(|s, pin, v| {
            set_mask_bit(&mut s.spi.idle_cs, pin, v == 1);
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "cs_active_#",
        width: 1,
        symbols: LEVELS,
        set: Setter::Pin(|s, pin, v| {
            set_mask_bit(&mut s.spi.active_cs, pin, v == 1);
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "cs_data_delay",
        width: 16,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.spi.cs_to_data_delay = v as u16;
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "data_cs_delay",
        width: 16,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.spi.last_data_to_cs_delay = v as u16;
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "data_data_delay",
        width: 16,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.spi.data_to_data_delay = v as u16;
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "bytes_per_transaction",
        width: 16,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.spi.bytes_per_transaction = v as u16;
            Ok(())
        }),
    },
    Field {
        section: SPI,
        key: "spi_mode",
        width: 2,
        symbols: SPI_MODES,
        set: Setter::Value(|s, v| {
            s.spi.mode = SpiMode::from_bits(v as u8).ok_or("invalid SPI mode")?;
            Ok(())
        }),
    },
    // USB
    Field {
        section: USB,
        key: "power_option",
        width: 8,
        symbols: POWER_OPTIONS,
        set: Setter::Value(|s, v| {
            s.usb.power = PowerOption(v as u8);
            Ok(())
        }),
    },
    Field {
        section: USB,
        key: "request_current",
        width: 9,
        symbols: &[],
        set: Setter::Value(|s, v| {
            if v % 2 != 0 || v > 510 {
                return Err(format!("{} mA must be even and at most 510", v));
            }
            s.usb.requested_current_ma = v as u16;
            Ok(())
        }),
    },
    Field {
        section: USB,
        key: "vid",
        width: 16,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.usb.vid = v as u16;
            Ok(())
        }),
    },
    Field {
        section: USB,
        key: "pid",
        width: 16,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.usb.pid = v as u16;
            Ok(())
        }),
    },
    // CHIP
    Field {
        section: CHIP,
        key: "gp#",
        width: 2,
        symbols: DESIGNATIONS,
        set: Setter::Pin(|s, pin, v| {
            s.chip.pins[pin] = PinDesignation::from_code(v as u8)
                .ok_or_else(|| format!("designation {} is not gpio (0), cs (1) or dedicated (2)", v))?;
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "gp#_dir",
        width: 1,
        symbols: DIRECTIONS,
        set: Setter::Pin(|s, pin, v| {
            set_mask_bit(&mut s.chip.default_direction, pin, v == 1);
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "gp#_out",
        width: 1,
        symbols: LEVELS,
        set: Setter::Pin(|s, pin, v| {
            set_mask_bit(&mut s.chip.default_output, pin, v == 1);
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "remote_wakeup",
        width: 1,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.chip.remote_wakeup = v == 1;
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "interrupt_mode",
        width: 3,
        symbols: INTERRUPT_MODES,
        set: Setter::Value(|s, v| {
            s.chip.interrupt_mode =
                InterruptMode::from_bits(v as u8).ok_or("interrupt mode must be 0-4")?;
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "spi_bus_release",
        width: 1,
        symbols: &[],
        set: Setter::Value(|s, v| {
            s.chip.spi_bus_release = v == 1;
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "access_control",
        width: 8,
        symbols: ACCESS_MODES,
        set: Setter::Value(|s, v| {
            s.chip.access_control = AccessControl::from_code(v as u8)
                .ok_or("access control must be 0x00, 0x40 or 0x80")?;
            Ok(())
        }),
    },
    Field {
        section: CHIP,
        key: "password",
        width: 0,
        symbols: &[],
        set: Setter::Text(|s, text| {
            s.chip.password = Some(Password::new(text).map_err(|e| e.to_string())?);
            Ok(())
        }),
    },
];
