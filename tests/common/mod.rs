//! Simulated MCP2210 for integration tests.
//!
//! `SimBridge` implements `HidChannel` and answers reports the way the chip
//! does. Its state sits behind `Rc<RefCell<..>>` so a test can keep a handle
//! for inspection and fault injection after moving the channel into an
//! `Mcp2210`. Behind the SPI engine sit a DAC5687 register model (GP0
//! chip select) and a CPLD SRAM model (GP1 chip select); any other chip
//! select loops the data back.

#![allow(dead_code)]

use dds_host::{HidChannel, Mcp2210, Result};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub const REPORT_LEN: usize = 64;

/// One completed SPI transaction seen by the simulated engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiTransaction {
    pub idle_cs: u16,
    pub active_cs: u16,
    pub bit_rate: u32,
    pub tx: Vec<u8>,
}

#[derive(Debug)]
pub struct SimState {
    /// Every request report received, in order.
    pub requests: Vec<[u8; REPORT_LEN]>,

    pub spi_current: [u8; REPORT_LEN],
    pub spi_power_up: [u8; REPORT_LEN],
    pub chip_current: [u8; REPORT_LEN],
    pub chip_power_up: [u8; REPORT_LEN],
    pub usb_key: [u8; REPORT_LEN],
    pub product_name: [u8; REPORT_LEN],
    pub manufacturer_name: [u8; REPORT_LEN],

    pub gpio_values: u16,
    pub gpio_directions: u16,
    pub eeprom: [u8; 256],
    pub interrupt_count: u16,
    pub bus_owner: u8,
    /// An external master asked for the bus.
    pub bus_release_requested: bool,
    pub password_attempts: u8,

    /// Statuses returned, in order, for SPI transfer reports before the
    /// engine accepts data again.
    pub spi_busy: VecDeque<u8>,
    /// Status returned for every SPI transfer report while set.
    pub spi_stuck: Option<u8>,
    /// Fail the SPI transaction with this index (0-based) with a status.
    pub spi_fail_transaction: Option<(usize, u8)>,
    /// Status forced onto every response of a command code.
    pub status_override: HashMap<u8, u8>,
    /// Value placed in the received-length byte instead of the real count.
    pub spi_rx_len_override: Option<u8>,

    pub transactions: Vec<SpiTransaction>,
    pub spi_transfer_reports: usize,
    pub cancels: usize,
    pub bus_releases: Vec<u8>,

    pub dac_registers: [u8; 32],
    pub sram: HashMap<u32, u32>,

    active_tx: Vec<u8>,
    transaction_started: bool,
    pending_rx: VecDeque<u8>,
    transactions_started: usize,
    response: [u8; REPORT_LEN],
}

impl SimState {
    fn new() -> Self {
        let mut state = SimState {
            requests: Vec::new(),
            spi_current: [0; REPORT_LEN],
            spi_power_up: [0; REPORT_LEN],
            chip_current: [0; REPORT_LEN],
            chip_power_up: [0; REPORT_LEN],
            usb_key: [0; REPORT_LEN],
            product_name: [0; REPORT_LEN],
            manufacturer_name: [0; REPORT_LEN],
            gpio_values: 0x01FF,
            gpio_directions: 0x01FF,
            eeprom: [0xFF; 256],
            interrupt_count: 0,
            bus_owner: 0,
            bus_release_requested: false,
            password_attempts: 0,
            spi_busy: VecDeque::new(),
            spi_stuck: None,
            spi_fail_transaction: None,
            status_override: HashMap::new(),
            spi_rx_len_override: None,
            transactions: Vec::new(),
            spi_transfer_reports: 0,
            cancels: 0,
            bus_releases: Vec::new(),
            dac_registers: [0; 32],
            sram: HashMap::new(),
            active_tx: Vec::new(),
            transaction_started: false,
            pending_rx: VecDeque::new(),
            transactions_started: 0,
            response: [0; REPORT_LEN],
        };

        // Factory defaults: 12 MHz, CS idle high on GP0/GP1, mode 0, 4 bytes.
        for spi in [&mut state.spi_current, &mut state.spi_power_up] {
            spi[4..8].copy_from_slice(&12_000_000u32.to_le_bytes());
            spi[8..10].copy_from_slice(&0x0003u16.to_le_bytes());
            spi[18..20].copy_from_slice(&4u16.to_le_bytes());
        }
        // GP0/GP1 chip selects, the rest GPIO, all outputs high.
        for chip in [&mut state.chip_current, &mut state.chip_power_up] {
            chip[4] = 0x01;
            chip[5] = 0x01;
            chip[13..15].copy_from_slice(&0x01FFu16.to_le_bytes());
        }
        state.usb_key[12..14].copy_from_slice(&0x04D8u16.to_le_bytes());
        state.usb_key[14..16].copy_from_slice(&0x00DEu16.to_le_bytes());
        state.usb_key[29] = 0x80;
        state.usb_key[30] = 50;
        set_string(&mut state.product_name, "MCP2210 USB to SPI Master");
        set_string(&mut state.manufacturer_name, "Microchip Technology Inc.");
        state
    }

    fn bytes_per_transaction(&self) -> usize {
        usize::from(u16::from_le_bytes([self.spi_current[18], self.spi_current[19]]))
    }

    fn handle(&mut self, request: &[u8; REPORT_LEN]) -> [u8; REPORT_LEN] {
        self.requests.push(*request);
        let mut resp = [0u8; REPORT_LEN];
        resp[0] = request[0];
        let command = request[0];

        if let Some(&status) = self.status_override.get(&command) {
            resp[1] = status;
            return resp;
        }

        match command {
            0x10 | 0x11 => {
                if command == 0x11 {
                    self.cancels += 1;
                    self.active_tx.clear();
                    self.pending_rx.clear();
                    self.transaction_started = false;
                }
                resp[2] = u8::from(!self.bus_release_requested);
                resp[3] = self.bus_owner;
                resp[4] = self.password_attempts;
            }
            0x12 => {
                resp[4..6].copy_from_slice(&self.interrupt_count.to_le_bytes());
                if request[1] == 0x00 {
                    self.interrupt_count = 0;
                }
            }
            0x20 => resp[4..].copy_from_slice(&self.chip_current[4..]),
            0x21 => self.chip_current[4..].copy_from_slice(&request[4..]),
            0x30 => self.gpio_values = u16::from_le_bytes([request[4], request[5]]) & 0x01FF,
            0x31 => resp[4..6].copy_from_slice(&self.gpio_values.to_le_bytes()),
            0x32 => self.gpio_directions = u16::from_le_bytes([request[4], request[5]]) & 0x01FF,
            0x33 => resp[4..6].copy_from_slice(&self.gpio_directions.to_le_bytes()),
            0x40 => {
                if self.transaction_started {
                    resp[1] = 0xF8;
                } else {
                    self.spi_current[4..].copy_from_slice(&request[4..]);
                }
            }
            0x41 => resp[4..].copy_from_slice(&self.spi_current[4..]),
            0x42 => self.spi_transfer(request, &mut resp),
            0x50 => {
                resp[2] = request[1];
                resp[3] = self.eeprom[usize::from(request[1])];
            }
            0x51 => self.eeprom[usize::from(request[1])] = request[2],
            0x60 => self.set_nvram(request, &mut resp),
            0x61 => self.get_nvram(request, &mut resp),
            0x70 => {
                if request[4..12] == self.chip_power_up[19..27] {
                    self.password_attempts = 0;
                } else {
                    self.password_attempts += 1;
                    resp[1] = if self.password_attempts > 5 { 0xFD } else { 0xFB };
                }
            }
            0x80 => self.bus_releases.push(request[1]),
            _ => resp[1] = 0xF9,
        }
        resp
    }

    fn set_nvram(&mut self, request: &[u8; REPORT_LEN], resp: &mut [u8; REPORT_LEN]) {
        resp[2] = request[1];
        match request[1] {
            0x10 => self.spi_power_up[4..].copy_from_slice(&request[4..]),
            0x20 => self.chip_power_up[4..].copy_from_slice(&request[4..]),
            0x30 => {
                self.usb_key[12..14].copy_from_slice(&request[4..6]);
                self.usb_key[14..16].copy_from_slice(&request[6..8]);
                self.usb_key[29] = request[8];
                self.usb_key[30] = request[9];
            }
            0x40 => self.product_name[4..].copy_from_slice(&request[4..]),
            0x50 => self.manufacturer_name[4..].copy_from_slice(&request[4..]),
            _ => resp[1] = 0xF9,
        }
    }

    fn get_nvram(&mut self, request: &[u8; REPORT_LEN], resp: &mut [u8; REPORT_LEN]) {
        resp[2] = request[1];
        match request[1] {
            0x10 => resp[4..].copy_from_slice(&self.spi_power_up[4..]),
            0x20 => {
                resp[4..].copy_from_slice(&self.chip_power_up[4..]);
                // The password is never reported back.
                resp[19..27].fill(0);
            }
            0x30 => resp[4..].copy_from_slice(&self.usb_key[4..]),
            0x40 => resp[4..].copy_from_slice(&self.product_name[4..]),
            0x50 => resp[4..].copy_from_slice(&self.manufacturer_name[4..]),
            _ => resp[1] = 0xF9,
        }
    }

    /// GP lines asserted during a transaction.
    fn selected(&self) -> u16 {
        let idle_cs = u16::from_le_bytes([self.spi_current[8], self.spi_current[9]]);
        let active_cs = u16::from_le_bytes([self.spi_current[10], self.spi_current[11]]);
        idle_cs & !active_cs
    }

    fn spi_transfer(&mut self, request: &[u8; REPORT_LEN], resp: &mut [u8; REPORT_LEN]) {
        self.spi_transfer_reports += 1;
        if let Some(status) = self.spi_stuck {
            resp[1] = status;
            return;
        }
        if let Some(status) = self.spi_busy.pop_front() {
            resp[1] = status;
            return;
        }

        let len = usize::from(request[1]);
        let first = len > 0 && !self.transaction_started;
        if first {
            if let Some((index, status)) = self.spi_fail_transaction {
                if index == self.transactions_started {
                    self.transactions_started += 1;
                    resp[1] = status;
                    return;
                }
            }
            self.transactions_started += 1;
            self.transaction_started = true;
        }

        // Data clocked in by earlier chunks comes back one report later.
        let count = self.pending_rx.len().min(60);
        for (i, byte) in self.pending_rx.drain(..count).enumerate() {
            resp[4 + i] = byte;
        }
        if count > 0 {
            resp[2] = self.spi_rx_len_override.unwrap_or(count as u8);
        }

        let chunk = &request[4..4 + len];
        self.active_tx.extend_from_slice(chunk);
        if !matches!(self.selected(), 0x0001 | 0x0002) {
            self.pending_rx.extend(chunk.iter().copied());
        }
        self.complete_if_done();

        resp[3] = if first {
            0x20
        } else if self.transaction_started || !self.pending_rx.is_empty() {
            if count > 0 {
                0x30
            } else {
                0x20
            }
        } else {
            0x10
        };
    }

    fn complete_if_done(&mut self) {
        if !self.transaction_started || self.active_tx.len() < self.bytes_per_transaction() {
            return;
        }
        let tx = std::mem::take(&mut self.active_tx);
        let bit_rate = u32::from_le_bytes([
            self.spi_current[4],
            self.spi_current[5],
            self.spi_current[6],
            self.spi_current[7],
        ]);
        match self.selected() {
            0x0001 => {
                let rx = self.dac_access(&tx);
                self.pending_rx.extend(rx);
            }
            0x0002 => {
                let rx = self.sram_access(&tx);
                self.pending_rx.extend(rx);
            }
            // Loopback data was already queued chunk by chunk.
            _ => {}
        }
        self.transactions.push(SpiTransaction {
            idle_cs: u16::from_le_bytes([self.spi_current[8], self.spi_current[9]]),
            active_cs: u16::from_le_bytes([self.spi_current[10], self.spi_current[11]]),
            bit_rate,
            tx,
        });
        self.transaction_started = false;
    }

    fn dac_access(&mut self, tx: &[u8]) -> Vec<u8> {
        let instruction = tx[0];
        let read = instruction & 0x80 != 0;
        let start = usize::from(instruction & 0x1F);
        let mut rx = vec![0u8; tx.len()];
        for (i, byte) in tx[1..].iter().enumerate() {
            let address = (start + i) & 0x1F;
            if read {
                rx[i + 1] = self.dac_registers[address];
            } else {
                self.dac_registers[address] = *byte;
            }
        }
        rx
    }

    fn sram_access(&mut self, tx: &[u8]) -> Vec<u8> {
        let mut rx = vec![0u8; tx.len()];
        if tx.len() != 7 {
            return rx;
        }
        let address =
            u32::from(tx[0] >> 6) | (u32::from(tx[1]) << 2) | (u32::from(tx[2] & 0x7F) << 10);
        if tx[0] & 0x01 != 0 {
            let data = self.sram.get(&address).copied().unwrap_or(0);
            rx[3..7].copy_from_slice(&data.to_le_bytes());
        } else {
            self.sram
                .insert(address, u32::from_le_bytes([tx[3], tx[4], tx[5], tx[6]]));
        }
        rx
    }

    /// Commands of all requests received so far.
    pub fn commands(&self) -> Vec<u8> {
        self.requests.iter().map(|r| r[0]).collect()
    }
}

fn set_string(report: &mut [u8; REPORT_LEN], text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    report[4] = (units.len() * 2 + 2) as u8;
    report[5] = 0x03;
    for (i, unit) in units.iter().enumerate() {
        report[6 + 2 * i..8 + 2 * i].copy_from_slice(&unit.to_le_bytes());
    }
}

/// `HidChannel` backed by the simulated chip.
#[derive(Debug, Clone)]
pub struct SimBridge {
    state: Rc<RefCell<SimState>>,
}

impl SimBridge {
    pub fn new() -> Self {
        SimBridge {
            state: Rc::new(RefCell::new(SimState::new())),
        }
    }

    pub fn state(&self) -> std::cell::RefMut<'_, SimState> {
        self.state.borrow_mut()
    }
}

impl HidChannel for SimBridge {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut request = [0u8; REPORT_LEN];
        let len = data.len().min(REPORT_LEN);
        request[..len].copy_from_slice(&data[..len]);
        let mut state = self.state.borrow_mut();
        state.response = state.handle(&request);
        Ok(len)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let state = self.state.borrow();
        let len = buf.len().min(REPORT_LEN);
        buf[..len].copy_from_slice(&state.response[..len]);
        Ok(len)
    }
}

/// Opens a handle on a fresh simulated chip and returns both.
pub fn sim_device() -> (Mcp2210<SimBridge>, SimBridge) {
    let _ = env_logger::builder().is_test(true).try_init();
    let sim = SimBridge::new();
    (Mcp2210::from_channel(sim.clone()), sim)
}
