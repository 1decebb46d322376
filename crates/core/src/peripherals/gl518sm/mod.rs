// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Genesys Logic GL518SM hardware monitor.

pub mod registers;
pub mod reset;

use crate::conversion::resistor_divider;
use crate::sensors::{HwmValues, SensorSource};
use crate::{SimResult, SimulationError, SmbusDevice};
use registers::{ConfFlags, RegisterFile, Store, WriteEffect, REGISTER_COUNT, REG_FAN_COUNT};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// Register pointer latched by a Send Byte.
///
/// Command-addressed transactions leave the pointer alone but consume the
/// pending selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "register", rename_all = "snake_case")]
pub enum Selection {
    Idle(u8),
    Pending(u8),
}

impl Selection {
    pub fn register(self) -> u8 {
        match self {
            Selection::Idle(reg) | Selection::Pending(reg) => reg,
        }
    }

    fn settle(self) -> Self {
        Selection::Idle(self.register())
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Idle(0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Gl518smState {
    registers: Vec<u16>,
    selection: Selection,
}

#[derive(Debug)]
pub struct Gl518sm {
    registers: RegisterFile,
    selection: Selection,
    sensors: Arc<dyn SensorSource>,
}

impl Gl518sm {
    /// Power up against `sensors`; registers already hold reset defaults.
    pub fn new(sensors: Arc<dyn SensorSource>) -> Self {
        let mut chip = Self {
            registers: RegisterFile::new(),
            selection: Selection::default(),
            sensors,
        };
        chip.reset();
        chip
    }

    /// Readings the platform seeds before the first reset.
    ///
    /// The +12V input sits behind the 15K/4.7K divider suggested by the
    /// datasheet.
    pub fn default_values(vcore_mv: u32) -> HwmValues {
        HwmValues {
            fans: vec![3000, 3000],
            temperatures: vec![30],
            voltages: vec![vcore_mv, resistor_divider(12000, 150, 47), 3300],
        }
    }

    pub fn reset(&mut self) {
        self.registers = reset::power_on_defaults(self.sensors.as_ref());
        tracing::debug!("GL518SM: reset");
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn read(&self, reg: u8) -> u16 {
        let ret = self.registers.read(reg);
        tracing::debug!("GL518SM: read({:02X}) = {:04X}", reg, ret);
        ret
    }

    /// Returns false when the register is read-only and nothing changed.
    pub fn write(&mut self, reg: u8, val: u16) -> bool {
        tracing::debug!("GL518SM: write({:02X}, {:04X})", reg, val);

        match self.registers.store(reg, val) {
            Store::Ignored => false,
            Store::Stored => true,
            Store::Pending(WriteEffect::InitOnFlag) => {
                if ConfFlags::from_bits_truncate(val).contains(ConfFlags::INIT) {
                    self.reset();
                }
                true
            }
            Store::Pending(WriteEffect::RecomputeFans) => {
                let divisors = reset::misc_divisors(self.registers.raw(reg));
                let count = reset::fan_count(self.sensors.as_ref(), divisors);
                self.registers.set_raw(REG_FAN_COUNT, count);
                true
            }
        }
    }
}

impl SmbusDevice for Gl518sm {
    fn read_byte(&mut self) -> u8 {
        self.read(self.selection.register()) as u8
    }

    fn read_byte_cmd(&mut self, cmd: u8) -> u8 {
        self.selection = self.selection.settle();
        self.read(cmd) as u8
    }

    fn read_word_cmd(&mut self, cmd: u8) -> u16 {
        self.selection = self.selection.settle();
        self.read(cmd)
    }

    fn write_byte(&mut self, val: u8) {
        self.selection = Selection::Pending(val);
    }

    fn write_byte_cmd(&mut self, cmd: u8, val: u8) {
        self.selection = self.selection.settle();
        self.write(cmd, val as u16);
    }

    fn write_word_cmd(&mut self, cmd: u8, val: u16) {
        self.selection = self.selection.settle();
        self.write(cmd, val);
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        let state = Gl518smState {
            registers: self.registers.as_slice().to_vec(),
            selection: self.selection,
        };
        serde_json::to_value(state).unwrap_or(serde_json::Value::Null)
    }

    fn restore(&mut self, state: serde_json::Value) -> SimResult<()> {
        let reject = |reason: String| SimulationError::Snapshot {
            device: "gl518sm".to_string(),
            reason,
        };
        let state: Gl518smState =
            serde_json::from_value(state).map_err(|e| reject(e.to_string()))?;
        let regs: [u16; REGISTER_COUNT] = state.registers.try_into().map_err(|v: Vec<u16>| {
            reject(format!(
                "expected {} registers, got {}",
                REGISTER_COUNT,
                v.len()
            ))
        })?;

        self.registers = RegisterFile::from_raw(regs);
        self.selection = state.selection;
        Ok(())
    }
}
