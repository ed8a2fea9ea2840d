//! DAC5687 register map, settings model and the field-to-register bit table.

use bit_field::BitField;
use std::ops::Range;

// --- Register Addresses ---
pub const VERSION: u8 = 0x00;
pub const CONFIG0: u8 = 0x01;
pub const CONFIG1: u8 = 0x02;
pub const CONFIG2: u8 = 0x03;
pub const CONFIG3: u8 = 0x04;
pub const SYNC_CNTL: u8 = 0x05;
pub const SER_DATA_0: u8 = 0x06;
pub const SER_DATA_1: u8 = 0x07;
pub const NCO_FREQ_0: u8 = 0x09;
pub const NCO_FREQ_1: u8 = 0x0A;
pub const NCO_FREQ_2: u8 = 0x0B;
pub const NCO_FREQ_3: u8 = 0x0C;
pub const NCO_PHASE_0: u8 = 0x0D;
pub const NCO_PHASE_1: u8 = 0x0E;
pub const DACA_OFFSET_0: u8 = 0x0F;
pub const DACB_OFFSET_0: u8 = 0x10;
pub const DACA_OFFSET_1: u8 = 0x11;
pub const DACB_OFFSET_1: u8 = 0x12;
pub const QMCA_GAIN_0: u8 = 0x13;
pub const QMCB_GAIN_0: u8 = 0x14;
pub const QMC_PHASE_0: u8 = 0x15;
pub const QMC_PHASE_GAIN_1: u8 = 0x16;
pub const DACA_GAIN_0: u8 = 0x17;
pub const DACB_GAIN_0: u8 = 0x18;
pub const DAC_GAIN_1: u8 = 0x19;
pub const ATEST: u8 = 0x1B;
pub const DAC_TEST: u8 = 0x1C;
pub const TEST_1D: u8 = 0x1D;

/// Highest 5-bit register address.
pub const MAX_ADDRESS: u8 = 0x1F;
/// Addresses that must never be accessed.
pub const RESERVED: [u8; 3] = [0x08, 0x1A, 0x1E];
/// Longest burst the instruction byte can encode.
pub const MAX_BURST: usize = 4;

/// Registers written by a full configuration, in write order.
pub const CONFIGURED_REGISTERS: [u8; 28] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1B, 0x1C, 0x1D,
];

pub fn is_reserved(address: u8) -> bool {
    RESERVED.contains(&address)
}

// --- Settings Model ---

/// VERSION register: sleep and high-pass controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub sleep_dac_a: bool,
    pub sleep_dac_b: bool,
    pub hpla: bool,
    pub hplb: bool,
}

/// CONFIG0: PLL and interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config0 {
    /// VCO divider: 0 = /1, 1 = /2, 2 = /4, 3 = /8.
    pub pll_div: u8,
    pub pll_freq: bool,
    pub pll_kv: bool,
    /// FIR interpolation: 0 = X2, 1 = X4, 2 = X4L, 3 = X8.
    pub interp: u8,
    pub inv_pll_lock: bool,
    pub fifo_bypass: bool,
}

/// CONFIG1: input format and filter bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config1 {
    pub qflag: bool,
    pub interl: bool,
    pub dual_clk: bool,
    pub twos: bool,
    pub rev_abus: bool,
    pub rev_bbus: bool,
    pub fir_bypass: bool,
    pub full_bypass: bool,
}

/// CONFIG2: NCO, QMC and coarse mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config2 {
    pub nco: bool,
    pub nco_gain: bool,
    pub qmc: bool,
    /// Coarse mixer mode (4 bits).
    pub cm_mode: u8,
    pub inv_sinc: bool,
}

/// CONFIG3: serial interface and test counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config3 {
    pub sif_4pin: bool,
    pub dac_ser_data: bool,
    pub half_rate: bool,
    pub usb: bool,
    /// 0 = off, 4 = all, 5 = LSB, 6 = mid, 7 = MSB.
    pub counter_mode: u8,
}

/// SYNC_CNTL register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncControl {
    pub sync_phstr: bool,
    pub sync_nco: bool,
    pub sync_cm: bool,
    /// FIFO sync source (3 bits).
    pub sync_fifo: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Nco {
    pub frequency: u32,
    pub phase: u16,
}

/// Per-channel offset (13 bits) and gain (12 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DacChannel {
    pub offset: u16,
    pub gain: u16,
}

/// Quadrature modulator correction: gains 11 bits, phase 10 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Qmc {
    pub gain_a: u16,
    pub gain_b: u16,
    pub phase: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Test {
    /// ATEST (5 bits).
    pub atest: u8,
    pub phstr_del: u8,
    pub phstr_clk_div_sel: bool,
}

/// Complete DAC5687 configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConverterSettings {
    pub version: Version,
    pub config0: Config0,
    pub config1: Config1,
    pub config2: Config2,
    pub config3: Config3,
    pub sync: SyncControl,
    /// Serial-interface DAC data word.
    pub dac_data: u16,
    pub nco: Nco,
    pub dac_a: DacChannel,
    pub dac_b: DacChannel,
    pub qmc: Qmc,
    pub test: Test,
}

// --- Bit Table ---

/// One slice of a settings field placed into a register.
pub struct BitSlice {
    pub register: u8,
    /// Bits occupied in the register.
    pub bits: Range<usize>,
    /// Field bit that lands in `bits.start`.
    pub shift: u32,
    pub value: fn(&ConverterSettings) -> u32,
}

const fn slice(
    register: u8,
    bits: Range<usize>,
    shift: u32,
    value: fn(&ConverterSettings) -> u32,
) -> BitSlice {
    BitSlice {
        register,
        bits,
        shift,
        value,
    }
}

pub static BIT_TABLE: &[BitSlice] = &[
    slice(VERSION, 7..8, 0, |s| s.version.sleep_dac_a.into()),
    slice(VERSION, 6..7, 0, |s| s.version.sleep_dac_b.into()),
    slice(VERSION, 5..6, 0, |s| s.version.hpla.into()),
    slice(VERSION, 4..5, 0, |s| s.version.hplb.into()),
    slice(CONFIG0, 6..8, 0, |s| s.config0.pll_div.into()),
    slice(CONFIG0, 5..6, 0, |s| s.config0.pll_freq.into()),
    slice(CONFIG0, 4..5, 0, |s| s.config0.pll_kv.into()),
    slice(CONFIG0, 2..4, 0, |s| s.config0.interp.into()),
    slice(CONFIG0, 1..2, 0, |s| s.config0.inv_pll_lock.into()),
    slice(CONFIG0, 0..1, 0, |s| s.config0.fifo_bypass.into()),
    slice(CONFIG1, 7..8, 0, |s| s.config1.qflag.into()),
    slice(CONFIG1, 6..7, 0, |s| s.config1.interl.into()),
    slice(CONFIG1, 5..6, 0, |s| s.config1.dual_clk.into()),
    slice(CONFIG1, 4..5, 0, |s| s.config1.twos.into()),
    slice(CONFIG1, 3..4, 0, |s| s.config1.rev_abus.into()),
    slice(CONFIG1, 2..3, 0, |s| s.config1.rev_bbus.into()),
    slice(CONFIG1, 1..2, 0, |s| s.config1.fir_bypass.into()),
    slice(CONFIG1, 0..1, 0, |s| s.config1.full_bypass.into()),
    slice(CONFIG2, 7..8, 0, |s| s.config2.nco.into()),
    slice(CONFIG2, 6..7, 0, |s| s.config2.nco_gain.into()),
    slice(CONFIG2, 5..6, 0, |s| s.config2.qmc.into()),
    slice(CONFIG2, 1..5, 0, |s| s.config2.cm_mode.into()),
    slice(CONFIG2, 0..1, 0, |s| s.config2.inv_sinc.into()),
    slice(CONFIG3, 7..8, 0, |s| s.config3.sif_4pin.into()),
    slice(CONFIG3, 6..7, 0, |s| s.config3.dac_ser_data.into()),
    slice(CONFIG3, 5..6, 0, |s| s.config3.half_rate.into()),
    slice(CONFIG3, 3..4, 0, |s| s.config3.usb.into()),
    slice(CONFIG3, 0..3, 0, |s| s.config3.counter_mode.into()),
    slice(SYNC_CNTL, 7..8, 0, |s| s.sync.sync_phstr.into()),
    slice(SYNC_CNTL, 6..7, 0, |s| s.sync.sync_nco.into()),
    slice(SYNC_CNTL, 5..6, 0, |s| s.sync.sync_cm.into()),
    slice(SYNC_CNTL, 2..5, 0, |s| s.sync.sync_fifo.into()),
    slice(SER_DATA_0, 0..8, 0, |s| s.dac_data.into()),
    slice(SER_DATA_1, 0..8, 8, |s| s.dac_data.into()),
    slice(NCO_FREQ_0, 0..8, 0, |s| s.nco.frequency),
    slice(NCO_FREQ_1, 0..8, 8, |s| s.nco.frequency),
    slice(NCO_FREQ_2, 0..8, 16, |s| s.nco.frequency),
    slice(NCO_FREQ_3, 0..8, 24, |s| s.nco.frequency),
    slice(NCO_PHASE_0, 0..8, 0, |s| s.nco.phase.into()),
    slice(NCO_PHASE_1, 0..8, 8, |s| s.nco.phase.into()),
    slice(DACA_OFFSET_0, 0..8, 0, |s| s.dac_a.offset.into()),
    slice(DACB_OFFSET_0, 0..8, 0, |s| s.dac_b.offset.into()),
    slice(DACA_OFFSET_1, 3..8, 8, |s| s.dac_a.offset.into()),
    slice(DACB_OFFSET_1, 3..8, 8, |s| s.dac_b.offset.into()),
    slice(QMCA_GAIN_0, 0..8, 0, |s| s.qmc.gain_a.into()),
    slice(QMCB_GAIN_0, 0..8, 0, |s| s.qmc.gain_b.into()),
    slice(QMC_PHASE_0, 0..8, 0, |s| s.qmc.phase.into()),
    slice(QMC_PHASE_GAIN_1, 6..8, 8, |s| s.qmc.phase.into()),
    slice(QMC_PHASE_GAIN_1, 3..6, 8, |s| s.qmc.gain_a.into()),
    slice(QMC_PHASE_GAIN_1, 0..3, 8, |s| s.qmc.gain_b.into()),
    slice(DACA_GAIN_0, 0..8, 0, |s| s.dac_a.gain.into()),
    slice(DACB_GAIN_0, 0..8, 0, |s| s.dac_b.gain.into()),
    slice(DAC_GAIN_1, 4..8, 8, |s| s.dac_a.gain.into()),
    slice(DAC_GAIN_1, 0..4, 8, |s| s.dac_b.gain.into()),
    slice(ATEST, 0..5, 0, |s| s.test.atest.into()),
    slice(DAC_TEST, 2..4, 0, |s| s.test.phstr_del.into()),
    slice(DAC_TEST, 1..2, 0, |s| s.test.phstr_clk_div_sel.into()),
];

impl ConverterSettings {
    /// Packs the settings into a full 32-entry register image.
    ///
    /// Field bits beyond a field's width are dropped; the key/value layer
    /// rejects such values before they reach here.
    pub fn to_registers(&self) -> [u8; 32] {
        let mut regs = [0u8; 32];
        for entry in BIT_TABLE {
            let width = entry.bits.end - entry.bits.start;
            let mask = (1u32 << width) - 1;
            let bits = ((entry.value)(self) >> entry.shift) & mask;
            regs[usize::from(entry.register)].set_bits(entry.bits.clone(), bits as u8);
        }
        regs
    }
}
