// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::registers::*;
use crate::conversion::{
    divisor_from_bits, rpm_to_reg, temp_to_reg, vdd_to_reg, voltage_to_reg,
};
use crate::sensors::SensorSource;

/// Divisor latched in MISC after reset.
pub const RESET_FAN_DIVISOR: u32 = 8;

/// Added to every voltage reading at reset. AOpen System Monitor rejects the
/// 3.3V rail without it.
pub const VOLTAGE_CALIBRATION: u16 = 13;

/// Nominal VDD rail fed to the VDD register at reset.
pub const VDD_NOMINAL_MV: u32 = 5000;

pub const CHIP_ID: u16 = 0x80;
/// Revision 0x80 exposes all voltage inputs.
pub const REVISION: u16 = 0x80;

const TEMP_MAX_DEFAULT: u16 = 0xC7;
const TEMP_HYST_DEFAULT: u16 = 0xC2;
const FAN_LIMIT_DEFAULT: u16 = 0x6464;
const VIN_LIMIT_DEFAULT: u16 = 0xDAC5;
const MISC_DEFAULT: u16 = 0xF8;

/// Both fan counts packed into FAN_COUNT: fan 1 high byte, fan 2 low byte.
pub fn fan_count(sensors: &dyn SensorSource, divisors: [u32; 2]) -> u16 {
    let fan1 = rpm_to_reg(sensors.fan_rpm(0), divisors[0]) as u16;
    let fan2 = rpm_to_reg(sensors.fan_rpm(1), divisors[1]) as u16;
    (fan1 << 8) | fan2
}

/// Fan divisors selected by a MISC value.
pub fn misc_divisors(misc: u16) -> [u32; 2] {
    [
        divisor_from_bits(misc >> MISC_FAN1_DIV_SHIFT),
        divisor_from_bits(misc >> MISC_FAN2_DIV_SHIFT),
    ]
}

fn calibrated(raw: u8) -> u16 {
    VOLTAGE_CALIBRATION + raw as u16
}

/// Full power-on register image computed from the current readings.
pub fn power_on_defaults(sensors: &dyn SensorSource) -> RegisterFile {
    let mut file = RegisterFile::new();

    file.set_raw(REG_CHIP_ID, CHIP_ID);
    file.set_raw(REG_REVISION, REVISION);
    file.set_raw(REG_TEMP_IN, temp_to_reg(sensors.temperature(0)) as u16);
    file.set_raw(REG_TEMP_MAX, TEMP_MAX_DEFAULT);
    file.set_raw(REG_TEMP_HYST, TEMP_HYST_DEFAULT);
    file.set_raw(
        REG_FAN_COUNT,
        fan_count(sensors, [RESET_FAN_DIVISOR, RESET_FAN_DIVISOR]),
    );
    file.set_raw(REG_FAN_LIMIT, FAN_LIMIT_DEFAULT);
    for reg in [REG_VIN1_LIMIT, REG_VIN2_LIMIT, REG_VIN3_LIMIT, REG_VDD_LIMIT] {
        file.set_raw(reg, VIN_LIMIT_DEFAULT);
    }
    file.set_raw(REG_VIN3, calibrated(voltage_to_reg(sensors.voltage_mv(2))));
    file.set_raw(REG_MISC, MISC_DEFAULT);
    file.set_raw(REG_VIN2, calibrated(voltage_to_reg(sensors.voltage_mv(1))));
    file.set_raw(REG_VIN1, calibrated(voltage_to_reg(sensors.voltage_mv(0))));
    file.set_raw(REG_VDD, calibrated(vdd_to_reg(VDD_NOMINAL_MV)));

    file
}
