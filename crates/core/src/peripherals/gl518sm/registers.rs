// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! GL518SM register map.
//!
//! Every per-register quirk lives in [`REGISTER_MAP`] so the compatibility
//! contract can be read (and tested) in one place.

use bitflags::bitflags;

pub const REGISTER_COUNT: usize = 32;

/// Register numbers are taken modulo the 32-slot file.
pub const REGISTER_INDEX_MASK: u8 = (REGISTER_COUNT as u8) - 1;

pub const REG_CHIP_ID: u8 = 0x00;
pub const REG_REVISION: u8 = 0x01;
pub const REG_CONF: u8 = 0x03;
pub const REG_TEMP_IN: u8 = 0x04;
pub const REG_TEMP_MAX: u8 = 0x05;
pub const REG_TEMP_HYST: u8 = 0x06;
pub const REG_FAN_COUNT: u8 = 0x07;
pub const REG_FAN_LIMIT: u8 = 0x08;
pub const REG_VIN1_LIMIT: u8 = 0x09;
pub const REG_VIN2_LIMIT: u8 = 0x0A;
pub const REG_VIN3_LIMIT: u8 = 0x0B;
pub const REG_VDD_LIMIT: u8 = 0x0C;
pub const REG_VIN3: u8 = 0x0D;
pub const REG_MISC: u8 = 0x0F;
pub const REG_MASK: u8 = 0x11;
pub const REG_VIN2: u8 = 0x13;
pub const REG_VIN1: u8 = 0x14;
pub const REG_VDD: u8 = 0x15;

bitflags! {
    /// CONF (0x03) bits with behavior in the model.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfFlags: u16 {
        /// Re-initialize the whole chip.
        const INIT = 0x80;
    }
}

/// MISC (0x0F) fan divisor fields.
pub const MISC_FAN1_DIV_SHIFT: u16 = 6;
pub const MISC_FAN2_DIV_SHIFT: u16 = 4;

/// How a stored slot is presented on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadShape {
    /// Single-byte register: low byte copied into the high byte.
    Duplicated,
    /// Two-byte register: stored value as-is.
    Word,
}

/// Chip-level action a write triggers after the value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEffect {
    /// Reset the chip when [`ConfFlags::INIT`] is set in the written value.
    InitOnFlag,
    /// Recompute FAN_COUNT from the new divisor fields.
    RecomputeFans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRule {
    ReadOnly,
    Verbatim,
    Masked(u16),
    /// Store verbatim, and copy the low byte into `target`.
    MirrorLow { target: u8 },
    Recompute { mask: u16, effect: WriteEffect },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDef {
    pub name: &'static str,
    pub shape: ReadShape,
    pub write: WriteRule,
}

const fn byte(name: &'static str, write: WriteRule) -> RegisterDef {
    RegisterDef {
        name,
        shape: ReadShape::Duplicated,
        write,
    }
}

const fn word(name: &'static str, write: WriteRule) -> RegisterDef {
    RegisterDef {
        name,
        shape: ReadShape::Word,
        write,
    }
}

const RESERVED: RegisterDef = byte("RESERVED", WriteRule::Verbatim);

pub static REGISTER_MAP: [RegisterDef; REGISTER_COUNT] = [
    byte("CHIP_ID", WriteRule::ReadOnly),   // 0x00
    byte("REVISION", WriteRule::ReadOnly),  // 0x01
    byte("VENDOR_ID", WriteRule::Verbatim), // 0x02
    byte(
        "CONF",
        WriteRule::Recompute {
            mask: 0xFC,
            effect: WriteEffect::InitOnFlag,
        },
    ), // 0x03
    byte("TEMP_IN", WriteRule::ReadOnly),   // 0x04
    byte("TEMP_MAX", WriteRule::Verbatim),  // 0x05
    byte("TEMP_HYST", WriteRule::Verbatim), // 0x06
    word("FAN_COUNT", WriteRule::ReadOnly), // 0x07
    word("FAN_LIMIT", WriteRule::Verbatim), // 0x08
    word("VIN1_LIMIT", WriteRule::Verbatim), // 0x09
    word(
        "VIN2_LIMIT",
        WriteRule::MirrorLow { target: REG_VIN2 },
    ), // 0x0A
    word("VIN3_LIMIT", WriteRule::Verbatim), // 0x0B
    word("VDD_LIMIT", WriteRule::Verbatim), // 0x0C
    byte("VIN3", WriteRule::ReadOnly),      // 0x0D
    RESERVED,                               // 0x0E
    byte(
        "MISC",
        WriteRule::Recompute {
            mask: 0xF8,
            effect: WriteEffect::RecomputeFans,
        },
    ), // 0x0F
    byte("ALARM", WriteRule::Verbatim),     // 0x10
    byte("MASK", WriteRule::Masked(0x7F)),  // 0x11
    byte("INT", WriteRule::ReadOnly),       // 0x12
    byte("VIN2", WriteRule::ReadOnly),      // 0x13
    byte("VIN1", WriteRule::ReadOnly),      // 0x14
    byte("VDD", WriteRule::ReadOnly),       // 0x15
    RESERVED,                               // 0x16
    RESERVED,                               // 0x17
    RESERVED,                               // 0x18
    RESERVED,                               // 0x19
    RESERVED,                               // 0x1A
    RESERVED,                               // 0x1B
    RESERVED,                               // 0x1C
    RESERVED,                               // 0x1D
    RESERVED,                               // 0x1E
    RESERVED,                               // 0x1F
];

pub fn index(reg: u8) -> usize {
    (reg & REGISTER_INDEX_MASK) as usize
}

pub fn definition(reg: u8) -> &'static RegisterDef {
    &REGISTER_MAP[index(reg)]
}

/// Read shape for a bus register number.
///
/// Only the in-range numbers of the two-byte registers read raw. An alias
/// such as 0x28 reaches the FAN_LIMIT slot but is shaped like a byte
/// register.
pub fn read_shape(reg: u8) -> ReadShape {
    match REGISTER_MAP.get(reg as usize) {
        Some(def) => def.shape,
        None => ReadShape::Duplicated,
    }
}

/// Outcome of storing a value into the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Ignored,
    Stored,
    /// Stored; the chip still has to run the effect.
    Pending(WriteEffect),
}

/// Raw 32-slot register storage plus the per-register write rules.
///
/// Effects that need outside state (sensor readings, a full reset) are
/// reported back to the caller instead of being run here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u16; REGISTER_COUNT],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
        }
    }

    pub fn from_raw(regs: [u16; REGISTER_COUNT]) -> Self {
        Self { regs }
    }

    pub fn raw(&self, reg: u8) -> u16 {
        self.regs[index(reg)]
    }

    pub fn set_raw(&mut self, reg: u8, val: u16) {
        self.regs[index(reg)] = val;
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.regs
    }

    /// Read with the bus-visible shaping applied.
    pub fn read(&self, reg: u8) -> u16 {
        let raw = self.raw(reg);
        match read_shape(reg) {
            ReadShape::Word => raw,
            ReadShape::Duplicated => {
                // Real hardware behavior unknown; drivers tolerate the copy.
                let low = raw & 0xFF;
                low | (low << 8)
            }
        }
    }

    pub fn store(&mut self, reg: u8, val: u16) -> Store {
        match definition(reg).write {
            WriteRule::ReadOnly => Store::Ignored,
            WriteRule::Verbatim => {
                self.set_raw(reg, val);
                Store::Stored
            }
            WriteRule::Masked(mask) => {
                self.set_raw(reg, val & mask);
                Store::Stored
            }
            WriteRule::MirrorLow { target } => {
                self.set_raw(target, val & 0xFF);
                self.set_raw(reg, val);
                Store::Stored
            }
            WriteRule::Recompute { mask, effect } => {
                self.set_raw(reg, val & mask);
                Store::Pending(effect)
            }
        }
    }
}
