//! `[section] key = value` table for DAC5687 settings.

use super::registers::ConverterSettings;
use crate::error::Result;
use crate::fields::{self, Field, Setter};

// One-bit flag stored as bool.
macro_rules! flag {
    ($section:expr, $key:literal, $($field:ident).+) => {
        Field {
            section: $section,
            key: $key,
            width: 1,
            symbols: &[],
            set: Setter::Value(|s, v| {
                s.$($field).+ = v == 1;
                Ok(())
            }),
        }
    };
}

// Multi-bit numeric field.
macro_rules! number {
    ($section:expr, $key:literal, $width:expr, $ty:ty, $symbols:expr, $($field:ident).+) => {
        Field {
            section: $section,
            key: $key,
            width: $width,
            symbols: $symbols,
            set: Setter::Value(|s, v| {
                s.$($field).+ = v as $ty;
                Ok(())
            }),
        }
    };
}

const VERSION: &str = "VERSION";
const CONFIG0: &str = "CONFIG0";
const CONFIG1: &str = "CONFIG1";
const CONFIG2: &str = "CONFIG2";
const CONFIG3: &str = "CONFIG3";
const SYNCCNTL: &str = "SYNCCNTL";
const NCO: &str = "NCO";
const DACA: &str = "DACA";
const DACB: &str = "DACB";
const QMC: &str = "QMC";
const TEST: &str = "TEST";
const SERDATA: &str = "SERDATA";

const PLL_DIVIDERS: &[(&str, u64)] = &[("div_1", 0), ("div_2", 1), ("div_4", 2), ("div_8", 3)];
const INTERPOLATIONS: &[(&str, u64)] = &[("x2", 0), ("x4", 1), ("x4l", 2), ("x8", 3)];
const COUNTER_MODES: &[(&str, u64)] = &[
    ("no_count", 0b000),
    ("all", 0b100),
    ("lsb", 0b101),
    ("mid", 0b110),
    ("msb", 0b111),
];
const SYNC_FIFO_SOURCES: &[(&str, u64)] = &[
    ("txenable", 0b000),
    ("phstr", 0b001),
    ("qflag", 0b010),
    ("db", 0b011),
    ("da", 0b100),
    ("sif", 0b101),
    ("off", 0b110),
    ("on", 0b111),
];

/// Keys of the DAC5687 sections.
pub static CONVERTER_FIELDS: &[Field<ConverterSettings>] = &[
    flag!(VERSION, "sleep_daca", version.sleep_dac_a),
    flag!(VERSION, "sleep_dacb", version.sleep_dac_b),
    flag!(VERSION, "hpla", version.hpla),
    flag!(VERSION, "hplb", version.hplb),
    number!(CONFIG0, "pll_div", 2, u8, PLL_DIVIDERS, config0.pll_div),
    flag!(CONFIG0, "pll_freq", config0.pll_freq),
    flag!(CONFIG0, "pll_kv", config0.pll_kv),
    number!(CONFIG0, "interp", 2, u8, INTERPOLATIONS, config0.interp),
    flag!(CONFIG0, "inv_plllock", config0.inv_pll_lock),
    flag!(CONFIG0, "fifo_bypass", config0.fifo_bypass),
    flag!(CONFIG1, "qflag", config1.qflag),
    flag!(CONFIG1, "interl", config1.interl),
    flag!(CONFIG1, "dual_clk", config1.dual_clk),
    flag!(CONFIG1, "twos", config1.twos),
    flag!(CONFIG1, "rev_abus", config1.rev_abus),
    flag!(CONFIG1, "rev_bbus", config1.rev_bbus),
    flag!(CONFIG1, "fir_bypass", config1.fir_bypass),
    flag!(CONFIG1, "full_bypass", config1.full_bypass),
    flag!(CONFIG2, "nco", config2.nco),
    flag!(CONFIG2, "nco_gain", config2.nco_gain),
    flag!(CONFIG2, "qmc", config2.qmc),
    number!(CONFIG2, "cm_mode", 4, u8, &[], config2.cm_mode),
    flag!(CONFIG2, "invsinc", config2.inv_sinc),
    flag!(CONFIG3, "sif_4pin", config3.sif_4pin),
    flag!(CONFIG3, "dac_ser_data", config3.dac_ser_data),
    flag!(CONFIG3, "half_rate", config3.half_rate),
    flag!(CONFIG3, "usb", config3.usb),
    number!(CONFIG3, "counter_mode", 3, u8, COUNTER_MODES, config3.counter_mode),
    flag!(SYNCCNTL, "sync_phstr", sync.sync_phstr),
    flag!(SYNCCNTL, "sync_nco", sync.sync_nco),
    flag!(SYNCCNTL, "sync_cm", sync.sync_cm),
    number!(SYNCCNTL, "sync_fifo", 3, u8, SYNC_FIFO_SOURCES, sync.sync_fifo),
    number!(NCO, "frequency", 32, u32, &[], nco.frequency),
    number!(NCO, "phase", 16, u16, &[], nco.phase),
    number!(DACA, "offset", 13, u16, &[], dac_a.offset),
    number!(DACA, "gain", 12, u16, &[], dac_a.gain),
    number!(DACB, "offset", 13, u16, &[], dac_b.offset),
    number!(DACB, "gain", 12, u16, &[], dac_b.gain),
    number!(QMC, "gain_a", 11, u16, &[], qmc.gain_a),
    number!(QMC, "gain_b", 11, u16, &[], qmc.gain_b),
    number!(QMC, "phase", 10, u16, &[], qmc.phase),
    number!(TEST, "atest", 5, u8, &[], test.atest),
    number!(TEST, "phstr_del", 2, u8, &[], test.phstr_del),
    flag!(TEST, "phstr_clk_div_sel", test.phstr_clk_div_sel),
    number!(SERDATA, "dac_data", 16, u16, &[], dac_data),
];

impl ConverterSettings {
    /// Applies one `[section] key = value` entry, e.g. `("DACA", "gain", "0x800")`.
    pub fn apply_setting(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        fields::apply(CONVERTER_FIELDS, self, section, key, value)
    }
}
