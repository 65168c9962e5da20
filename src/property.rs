//! Locally cached copies of values that live on the chip.
//!
//! A [`RemoteProperty`] is fetched the first time it is read and served from
//! the cache afterwards. A write stores the new value in the cache and pushes it
//! to the chip; the push response is the only confirmation. Each property is
//! described by a [`Remote`] marker type that names its fetch and push commands.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::response::{unexpected_body, ResponseBody};
use crate::settings::{ChipSettings, DeviceString, SpiSettings, UsbSettings};
use log::{debug, trace};
use std::fmt;
use std::marker::PhantomData;

/// Anything that can send a command and return its checked response body.
pub trait CommandChannel {
    fn send_command(&mut self, command: &Command) -> Result<ResponseBody>;
}

/// Describes one chip-side value: how to fetch it and how to push it.
pub trait Remote {
    type Value: Clone + fmt::Debug;

    /// Request that reads the value.
    fn fetch_command() -> Command;

    /// Pulls the value out of the fetch response.
    fn extract(body: ResponseBody) -> Result<Self::Value>;

    /// Request that writes `value`.
    fn push_command(value: &Self::Value) -> Command;
}

/// Lazily fetched, write-through cache of one remote value.
pub struct RemoteProperty<K: Remote> {
    cached: Option<K::Value>,
    _kind: PhantomData<K>,
}

impl<K: Remote> Default for RemoteProperty<K> {
    fn default() -> Self {
        RemoteProperty {
            cached: None,
            _kind: PhantomData,
        }
    }
}

impl<K: Remote> fmt::Debug for RemoteProperty<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProperty")
            .field("cached", &self.cached)
            .finish()
    }
}

impl<K: Remote> RemoteProperty<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value, without touching the chip.
    pub fn cached(&self) -> Option<&K::Value> {
        self.cached.as_ref()
    }

    /// Drops the cached value so the next read fetches it again.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Returns the cached value, fetching it first if needed.
    pub fn get<C: CommandChannel + ?Sized>(&mut self, channel: &mut C) -> Result<K::Value> {
        if let Some(value) = &self.cached {
            return Ok(value.clone());
        }
        let command = K::fetch_command();
        trace!("Fetching {}", command.kind());
        let value = K::extract(channel.send_command(&command)?)?;
        self.cached = Some(value.clone());
        Ok(value)
    }

    /// Caches `value` and pushes it to the chip.
    ///
    /// The cache keeps `value` even if the chip rejects the push; call
    /// [`invalidate`](Self::invalidate) to re-read what the chip holds.
    pub fn set<C: CommandChannel + ?Sized>(&mut self, channel: &mut C, value: K::Value) -> Result<()> {
        let command = K::push_command(&value);
        self.push_with(channel, value, &command)
    }

    /// Like [`set`](Self::set) but with a caller-built push command.
    pub(crate) fn push_with<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        value: K::Value,
        command: &Command,
    ) -> Result<()> {
        debug!("Pushing {}: {:?}", command.kind(), value);
        self.cached = Some(value);
        channel.send_command(command)?;
        Ok(())
    }
}

impl<K: Remote<Value = u16>> RemoteProperty<K> {
    /// Reads bit `bit` of the (cached) word.
    pub fn read_bit<C: CommandChannel + ?Sized>(&mut self, channel: &mut C, bit: u8) -> Result<bool> {
        let mask = bit_mask(bit)?;
        Ok(self.get(channel)? & mask != 0)
    }

    /// Changes bit `bit` and pushes the whole word once.
    pub fn write_bit<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        bit: u8,
        value: bool,
    ) -> Result<()> {
        let mask = bit_mask(bit)?;
        let current = self.get(channel)?;
        let word = if value { current | mask } else { current & !mask };
        self.set(channel, word)
    }
}

fn bit_mask(bit: u8) -> Result<u16> {
    if bit < 16 {
        Ok(1u16 << bit)
    } else {
        Err(Error::ArgumentOutOfRange(format!(
            "bit index {} out of range (0-15)",
            bit
        )))
    }
}

/// Marker types for every cached chip value.
pub mod remote {
    use super::*;

    macro_rules! remote_kind {
        ($(#[$doc:meta])* $name:ident, $value:ty, $fetch:expr, $variant:ident, $push:expr) => {
            $(#[$doc])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Remote for $name {
                type Value = $value;

                fn fetch_command() -> Command {
                    $fetch
                }

                fn extract(body: ResponseBody) -> Result<Self::Value> {
                    match body {
                        ResponseBody::$variant(value) => Ok(value),
                        other => Err(unexpected_body(Self::fetch_command().kind(), &other)),
                    }
                }

                fn push_command(value: &Self::Value) -> Command {
                    ($push)(value.clone())
                }
            }
        };
    }

    remote_kind!(
        /// USB manufacturer string.
        Manufacturer,
        DeviceString,
        Command::GetUsbManufacturer,
        UsbString,
        Command::SetUsbManufacturer
    );
    remote_kind!(
        /// USB product string.
        Product,
        DeviceString,
        Command::GetUsbProduct,
        UsbString,
        Command::SetUsbProduct
    );
    remote_kind!(
        /// Power-up chip settings.
        BootChip,
        ChipSettings,
        Command::GetBootChipSettings,
        ChipSettings,
        |settings| Command::SetBootChipSettings {
            settings,
            new_password: None,
        }
    );
    remote_kind!(
        /// Current chip settings.
        Chip,
        ChipSettings,
        Command::GetChipSettings,
        ChipSettings,
        Command::SetChipSettings
    );
    remote_kind!(
        /// Power-up SPI settings.
        BootSpi,
        SpiSettings,
        Command::GetBootSpiSettings,
        SpiSettings,
        Command::SetBootSpiSettings
    );
    remote_kind!(
        /// Current SPI settings.
        Spi,
        SpiSettings,
        Command::GetSpiSettings,
        SpiSettings,
        Command::SetSpiSettings
    );
    remote_kind!(
        /// Power-up USB key parameters.
        BootUsb,
        UsbSettings,
        Command::GetBootUsbSettings,
        UsbSettings,
        Command::SetBootUsbSettings
    );
    remote_kind!(
        /// GPIO direction word (bit set = input).
        GpioDirections,
        u16,
        Command::GetGpioDirection,
        Gpio,
        Command::SetGpioDirection
    );
    remote_kind!(
        /// GPIO output/input level word.
        GpioValues,
        u16,
        Command::GetGpioValue,
        Gpio,
        Command::SetGpioValue
    );
}
