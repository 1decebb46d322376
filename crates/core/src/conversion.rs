// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Physical quantity <-> register encodings used by the GL518SM.
//!
//! All functions are pure and integer-only. The truncation and clamping
//! behavior is part of the register contract seen by guest drivers.

/// Tachometer numerator: counts per minute at the fan count clock.
const RPM_NUMERATOR: u64 = 480_000;

/// Fan speed to FAN_COUNT byte. A stopped fan reads 0, otherwise the count
/// is clamped to 1..=255.
pub fn rpm_to_reg(rpm: u32, divisor: u32) -> u8 {
    if rpm == 0 {
        return 0;
    }
    let count = RPM_NUMERATOR / (rpm as u64 * divisor.max(1) as u64);
    count.clamp(1, 255) as u8
}

/// Decode a 2-bit divisor field (`2^n`).
pub fn divisor_from_bits(bits: u16) -> u32 {
    1 << (bits & 0x3)
}

/// Millivolts on a VIN pin (19 mV/LSB).
pub fn voltage_to_reg(mv: u32) -> u8 {
    ((mv / 19) & 0xFF) as u8
}

/// Millivolts on the VDD rail.
pub fn vdd_to_reg(mv: u32) -> u8 {
    (((mv as u64 * 4) / 95) & 0xFF) as u8
}

/// Degrees Celsius to TEMP_IN (offset 119, wraps).
pub fn temp_to_reg(celsius: i32) -> u8 {
    (celsius.wrapping_add(119) & 0xFF) as u8
}

/// Output of a two-resistor divider with `r1` on the high side.
pub fn resistor_divider(mv: u32, r1: u32, r2: u32) -> u32 {
    if r1 + r2 == 0 {
        return 0;
    }
    ((mv as u64 * r2 as u64) / (r1 as u64 + r2 as u64)) as u32
}
