//! GPIO pin helpers over the cached direction and value words.

use crate::consts;
use crate::device::Mcp2210;
use crate::error::{Error, Result};
use crate::transport::Transport;
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

impl From<bool> for GpioLevel {
    fn from(high: bool) -> Self {
        if high {
            GpioLevel::High
        } else {
            GpioLevel::Low
        }
    }
}

/// Represents a valid GPIO pin number (GP0-GP8).
/// Use `GpioPin::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpioPin(u8);

impl GpioPin {
    /// Creates a new GpioPin, returning an error if the number is out of range (0-8).
    pub fn new(pin_num: u8) -> Result<Self> {
        if pin_num < consts::gpio::PIN_COUNT {
            Ok(GpioPin(pin_num))
        } else {
            Err(Error::PinArgumentOutOfRange {
                pin: pin_num,
                message: "Pin number must be 0-8".to_string(),
            })
        }
    }

    /// Returns the underlying pin number (0-8).
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the bit mask (1 << number) within the GPIO words.
    #[inline]
    pub fn mask(&self) -> u16 {
        1u16 << self.0
    }
}

impl<T: Transport> Mcp2210<T> {
    // --- Whole-word access ---

    /// GPIO direction word; bit set means input.
    pub fn gpio_direction_raw(&mut self) -> Result<u16> {
        self.props.gpio_direction.get(&mut self.link)
    }

    pub fn set_gpio_direction_raw(&mut self, word: u16) -> Result<()> {
        debug!("Setting GPIO direction word 0x{:04X}", word);
        self.props.gpio_direction.set(&mut self.link, word)
    }

    /// GPIO level word.
    pub fn gpio_values_raw(&mut self) -> Result<u16> {
        self.props.gpio_values.get(&mut self.link)
    }

    pub fn set_gpio_values_raw(&mut self, word: u16) -> Result<()> {
        debug!("Setting GPIO value word 0x{:04X}", word);
        self.props.gpio_values.set(&mut self.link, word)
    }

    // --- Single pin ---

    /// Sets the direction of one pin with a single whole-word write.
    pub fn gpio_set_direction(&mut self, pin: GpioPin, direction: GpioDirection) -> Result<()> {
        trace!("GPIO {} direction {:?}", pin.number(), direction);
        self.props.gpio_direction.write_bit(
            &mut self.link,
            pin.number(),
            direction == GpioDirection::Input,
        )
    }

    pub fn gpio_get_direction(&mut self, pin: GpioPin) -> Result<GpioDirection> {
        let input = self.props.gpio_direction.read_bit(&mut self.link, pin.number())?;
        Ok(if input {
            GpioDirection::Input
        } else {
            GpioDirection::Output
        })
    }

    /// Sets the level of one pin with a single whole-word write.
    pub fn gpio_write(&mut self, pin: GpioPin, level: GpioLevel) -> Result<()> {
        trace!("GPIO {} level {:?}", pin.number(), level);
        self.props
            .gpio_values
            .write_bit(&mut self.link, pin.number(), level == GpioLevel::High)
    }

    /// Level of one pin as last read from or written to the chip.
    ///
    /// The value word is cached like every other property; call
    /// [`invalidate_cache`](Self::invalidate_cache) to sample input pins again.
    pub fn gpio_read(&mut self, pin: GpioPin) -> Result<GpioLevel> {
        let high = self.props.gpio_values.read_bit(&mut self.link, pin.number())?;
        Ok(GpioLevel::from(high))
    }
}
