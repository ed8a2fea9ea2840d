//! GP pin values and directions.
//!
//! Only pins designated as GPIO in the chip settings respond to these
//! commands; the chip ignores bits of CS and dedicated-function pins.

use crate::consts::{GPIO_COUNT, GPIO_MASK};
use crate::device::Mcp2210;
use crate::error::{Error, Result};
use crate::report::{Command, Report};
use crate::transport::HidChannel;
use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioDirection {
    Input,
    Output,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioLevel {
    Low,
    High,
}

/// Represents a valid GP pin number (0-8).
/// Use `GpioPin::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpioPin(u8);

impl GpioPin {
    /// Creates a new GpioPin, returning an error if the number is out of range (0-8).
    pub fn new(pin_num: u8) -> Result<Self> {
        if usize::from(pin_num) < GPIO_COUNT {
            Ok(GpioPin(pin_num))
        } else {
            Err(Error::ArgumentOutOfRange(format!(
                "GP pin {} out of range (0-8)",
                pin_num
            )))
        }
    }

    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the bit mask (1 << pin) used in the value/direction words.
    #[inline]
    pub fn mask(&self) -> u16 {
        1u16 << self.0
    }
}

impl<C: HidChannel> Mcp2210<C> {
    // --- Bulk GPIO Operations ---

    /// Reads the levels of GP0-GP8 (bit n = GPn).
    pub fn read_gpio_values(&mut self) -> Result<u16> {
        let response = self.transfer(&Report::new(Command::GetGpioValues))?;
        let values = response.u16_at(4) & GPIO_MASK;
        trace!("GPIO values: 0x{:03X}", values);
        Ok(values)
    }

    /// Sets the output levels of GP0-GP8 (bit n = GPn).
    pub fn write_gpio_values(&mut self, values: u16) -> Result<()> {
        trace!("Writing GPIO values: 0x{:03X}", values & GPIO_MASK);
        let mut request = Report::new(Command::SetGpioValues);
        request.set_u16(4, values & GPIO_MASK);
        self.transfer(&request)?;
        Ok(())
    }

    /// Reads the directions of GP0-GP8 (bit set = input).
    pub fn read_gpio_directions(&mut self) -> Result<u16> {
        let response = self.transfer(&Report::new(Command::GetGpioDirections))?;
        let directions = response.u16_at(4) & GPIO_MASK;
        trace!("GPIO directions: 0x{:03X}", directions);
        Ok(directions)
    }

    /// Sets the directions of GP0-GP8 (bit set = input).
    pub fn write_gpio_directions(&mut self, directions: u16) -> Result<()> {
        trace!("Writing GPIO directions: 0x{:03X}", directions & GPIO_MASK);
        let mut request = Report::new(Command::SetGpioDirections);
        request.set_u16(4, directions & GPIO_MASK);
        self.transfer(&request)?;
        Ok(())
    }

    // --- Single Pin GPIO ---

    pub fn gpio_read(&mut self, pin: GpioPin) -> Result<GpioLevel> {
        let values = self.read_gpio_values()?;
        Ok(if values & pin.mask() != 0 {
            GpioLevel::High
        } else {
            GpioLevel::Low
        })
    }

    /// Sets one pin's output level, leaving the others unchanged.
    pub fn gpio_write(&mut self, pin: GpioPin, level: GpioLevel) -> Result<()> {
        let current = self.read_gpio_values()?;
        let new = match level {
            GpioLevel::High => current | pin.mask(),
            GpioLevel::Low => current & !pin.mask(),
        };
        debug!("Setting GP{} {:?}", pin.number(), level);
        self.write_gpio_values(new)
    }

    pub fn gpio_get_direction(&mut self, pin: GpioPin) -> Result<GpioDirection> {
        let directions = self.read_gpio_directions()?;
        Ok(if directions & pin.mask() != 0 {
            GpioDirection::Input
        } else {
            GpioDirection::Output
        })
    }

    /// Sets one pin's direction, leaving the others unchanged.
    pub fn gpio_set_direction(&mut self, pin: GpioPin, direction: GpioDirection) -> Result<()> {
        let current = self.read_gpio_directions()?;
        let new = match direction {
            GpioDirection::Input => current | pin.mask(),
            GpioDirection::Output => current & !pin.mask(),
        };
        if new == current {
            trace!("GP{} already {:?}", pin.number(), direction);
            return Ok(());
        }
        debug!("Setting GP{} direction {:?}", pin.number(), direction);
        self.write_gpio_directions(new)
    }
}
