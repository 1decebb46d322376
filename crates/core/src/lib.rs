// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bus;
pub mod conversion;
pub mod device;
pub mod peripherals;
pub mod sensors;
pub mod snapshot;

use std::any::Any;

/// Highest valid 7-bit SMBus slave address.
pub const SMBUS_ADDR_MAX: u8 = 0x7F;

/// Any address at or above this value means "not bound to the bus".
pub const SMBUS_UNBOUND: u8 = 0x80;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("No device acknowledged SMBus address {0:#04x}")]
    NoDevice(u8),
    #[error("Out of resources while creating device '{0}'")]
    OutOfResources(String),
    #[error("Unknown device handle {0}")]
    UnknownDevice(usize),
    #[error("Snapshot rejected by '{device}': {reason}")]
    Snapshot { device: String, reason: String },
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait representing a slave device attached to an SMBus segment.
///
/// The transport delivers one transaction at a time. Each handler runs to
/// completion before the next one is dispatched, so implementations are free
/// to keep plain mutable state.
pub trait SmbusDevice: std::fmt::Debug + Send {
    /// Receive Byte: no command, uses the device's latched register pointer.
    fn read_byte(&mut self) -> u8;
    /// Read Byte with an explicit command byte.
    fn read_byte_cmd(&mut self, cmd: u8) -> u8;
    /// Read Word with an explicit command byte.
    fn read_word_cmd(&mut self, cmd: u8) -> u16;
    /// Send Byte: no command, the value itself is the payload.
    fn write_byte(&mut self, val: u8);
    fn write_byte_cmd(&mut self, cmd: u8, val: u8);
    fn write_word_cmd(&mut self, cmd: u8, val: u16);

    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
    fn restore(&mut self, _state: serde_json::Value) -> SimResult<()> {
        Ok(())
    }
}
