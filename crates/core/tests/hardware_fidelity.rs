// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_hwm::bus::{DeviceId, Smbus};
use labwired_hwm::conversion::resistor_divider;
use labwired_hwm::device::{self, GL518SM_2C, GL518SM_2D};
use labwired_hwm::peripherals::gl518sm::Gl518sm;
use labwired_hwm::sensors::{HwmValues, SharedSensors};

fn board_values() -> HwmValues {
    HwmValues {
        fans: vec![3000, 3000],
        temperatures: vec![30],
        voltages: vec![2050, resistor_divider(12000, 150, 47), 3300],
    }
}

fn board(addr_2d: bool) -> (Smbus, DeviceId, SharedSensors, u8) {
    let mut bus = Smbus::new();
    let sensors = SharedSensors::default();
    let info = if addr_2d { &GL518SM_2D } else { &GL518SM_2C };
    let id = device::create(&mut bus, "hwm", info, &sensors, board_values()).unwrap();
    (bus, id, sensors, info.local)
}

#[test]
fn test_power_on_scenario() {
    let (mut bus, _, _, addr) = board(false);

    // TEMP_IN = (30 + 119) & 0xFF, duplicated
    assert_eq!(bus.read_word_cmd(addr, 0x04).unwrap(), 0x9595);
    // FAN_COUNT = 480000 / (3000 * 8) for both fans
    assert_eq!(bus.read_word_cmd(addr, 0x07).unwrap(), 0x1414);
    assert_eq!(bus.read_word_cmd(addr, 0x00).unwrap(), 0x8080);
    assert_eq!(bus.read_word_cmd(addr, 0x01).unwrap(), 0x8080);
    assert_eq!(bus.read_word_cmd(addr, 0x0F).unwrap(), 0xF8F8);
}

#[test]
fn test_read_only_registers_survive_any_write() {
    let (mut bus, id, _, addr) = board(false);

    for reg in [0x00u8, 0x01, 0x04, 0x07, 0x0D, 0x12, 0x13, 0x14, 0x15] {
        let before = bus
            .device::<Gl518sm>(id)
            .map(|c| c.registers().raw(reg))
            .unwrap();
        for val in [0x0000u16, 0x00FF, 0xFFFF, 0x8080, 0x1234] {
            bus.write_word_cmd(addr, reg, val).unwrap();
            bus.write_byte_cmd(addr, reg, val as u8).unwrap();
        }
        let after = bus
            .device::<Gl518sm>(id)
            .map(|c| c.registers().raw(reg))
            .unwrap();
        assert_eq!(before, after, "register {:#04x} changed", reg);
    }
}

#[test]
fn test_single_byte_registers_read_duplicated() {
    let (mut bus, _, _, addr) = board(true);
    let plain = [0x02u8, 0x05, 0x06, 0x0E, 0x10, 0x16, 0x1F];

    for reg in plain {
        for val in [0x0001u16, 0x00A5, 0x1234, 0xFF00] {
            bus.write_word_cmd(addr, reg, val).unwrap();
            let low = val & 0xFF;
            assert_eq!(
                bus.read_word_cmd(addr, reg).unwrap(),
                low | (low << 8),
                "register {:#04x} value {:#06x}",
                reg,
                val
            );
        }
    }
}

#[test]
fn test_masked_registers_read_duplicated() {
    let (mut bus, _, _, addr) = board(true);

    bus.write_word_cmd(addr, 0x11, 0xFFFF).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x11).unwrap(), 0x7F7F);

    bus.write_byte_cmd(addr, 0x03, 0x7F).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x03).unwrap(), 0x7C7C);
}

#[test]
fn test_two_byte_registers_read_raw() {
    let (mut bus, _, _, addr) = board(true);

    for reg in [0x08u8, 0x09, 0x0A, 0x0B, 0x0C] {
        bus.write_word_cmd(addr, reg, 0xC0DE).unwrap();
        assert_eq!(bus.read_word_cmd(addr, reg).unwrap(), 0xC0DE);
    }
}

#[test]
fn test_vin2_limit_mirrors_into_vin2() {
    let (mut bus, _, _, addr) = board(false);

    bus.write_word_cmd(addr, 0x0A, 0x12AB).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x13).unwrap(), 0xABAB);
    assert_eq!(bus.read_word_cmd(addr, 0x0A).unwrap(), 0x12AB);

    bus.write_byte_cmd(addr, 0x0A, 0x42).unwrap();
    assert_eq!(bus.read_byte_cmd(addr, 0x13).unwrap(), 0x42);
}

#[test]
fn test_misc_divisor_one_for_fan1() {
    let (mut bus, _, sensors, addr) = board(false);

    for rpm in [1000u32, 2500, 3000, 5000, 20000] {
        sensors.update(|v| v.fans[0] = rpm);
        // bits 7:6 = 0b00 selects divisor 1
        bus.write_byte_cmd(addr, 0x0F, 0x00).unwrap();
        let expected = (480_000 / rpm).clamp(1, 255) as u16;
        assert_eq!(bus.read_word_cmd(addr, 0x07).unwrap() >> 8, expected);
    }

    sensors.update(|v| v.fans[0] = 0);
    bus.write_byte_cmd(addr, 0x0F, 0x00).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x07).unwrap() >> 8, 0);
}

#[test]
fn test_misc_divisor_fields() {
    let (mut bus, _, sensors, addr) = board(false);
    sensors.update(|v| v.fans = vec![3000, 3000]);

    // fan1: bits 7:6 = 0b10 -> 4, fan2: bits 5:4 = 0b01 -> 2
    bus.write_byte_cmd(addr, 0x0F, 0x97).unwrap();
    assert_eq!(bus.read_byte_cmd(addr, 0x0F).unwrap(), 0x90);
    assert_eq!(bus.read_word_cmd(addr, 0x07).unwrap(), (40 << 8) | 80);
}

#[test]
fn test_fan_count_tracks_live_readings_only_on_misc_write() {
    let (mut bus, _, sensors, addr) = board(false);

    sensors.update(|v| v.fans[1] = 6000);
    // No recompute yet
    assert_eq!(bus.read_word_cmd(addr, 0x07).unwrap(), 0x1414);

    bus.write_byte_cmd(addr, 0x0F, 0xF8).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x07).unwrap(), 0x140A);
}

#[test]
fn test_init_restores_every_register() {
    let (mut bus, id, sensors, addr) = board(true);
    let pristine = bus
        .device::<Gl518sm>(id)
        .map(|c| c.registers().clone())
        .unwrap();

    for reg in 0..0x20u8 {
        if reg != 0x03 {
            bus.write_word_cmd(addr, reg, 0x5A5A).unwrap();
        }
    }
    bus.write_byte_cmd(addr, 0x0F, 0x00).unwrap();

    bus.write_byte_cmd(addr, 0x03, 0x80).unwrap();
    let after = bus
        .device::<Gl518sm>(id)
        .map(|c| c.registers().clone())
        .unwrap();
    assert_eq!(after, pristine);

    // Reset re-samples the readings
    sensors.update(|v| {
        v.temperatures[0] = 50;
        v.voltages[2] = 5000;
    });
    bus.write_word_cmd(addr, 0x03, 0x00FF).unwrap();
    assert_eq!(bus.read_byte_cmd(addr, 0x04).unwrap(), 169);
    // 5000 / 19 = 263 -> 7 after the byte mask, + 13
    assert_eq!(bus.read_byte_cmd(addr, 0x0D).unwrap(), 20);
    assert_eq!(bus.read_byte_cmd(addr, 0x03).unwrap(), 0);
}

#[test]
fn test_receive_byte_uses_latched_pointer() {
    let (mut bus, _, _, addr) = board(true);

    bus.write_byte(addr, 0x07).unwrap();
    // Two-byte register, byte read returns the low byte
    assert_eq!(bus.read_byte(addr).unwrap(), 0x14);

    bus.write_byte(addr, 0x04).unwrap();
    assert_eq!(bus.read_byte_cmd(addr, 0x00).unwrap(), 0x80);
    assert_eq!(bus.read_byte(addr).unwrap(), 0x95);

    // A Send Byte never touches the register file
    bus.write_byte(addr, 0x02).unwrap();
    assert_eq!(bus.read_byte(addr).unwrap(), 0x00);
}

#[test]
fn test_rebind_moves_traffic() {
    let (mut bus, id, _, _) = board(false);

    assert_eq!(bus.remap(id, 0x2D).unwrap(), Some(0x2D));
    assert!(bus.write_byte_cmd(0x2C, 0x02, 0x11).is_err());
    bus.write_byte_cmd(0x2D, 0x02, 0x22).unwrap();
    assert_eq!(bus.read_byte_cmd(0x2D, 0x02).unwrap(), 0x22);
}

#[test]
fn test_two_chips_share_sensor_source() {
    let mut bus = Smbus::new();
    let sensors = SharedSensors::default();
    device::create(&mut bus, "a", &GL518SM_2C, &sensors, board_values()).unwrap();
    device::create(&mut bus, "b", &GL518SM_2D, &sensors, Gl518sm::default_values(1800)).unwrap();

    // Each chip sampled the readings at its own power-up
    assert_eq!(bus.read_byte_cmd(0x2C, 0x14).unwrap(), 120);
    // 1800 / 19 + 13
    assert_eq!(bus.read_byte_cmd(0x2D, 0x14).unwrap(), 107);

    // Both now see the second seed on reset
    bus.write_byte_cmd(0x2C, 0x03, 0x80).unwrap();
    assert_eq!(bus.read_byte_cmd(0x2C, 0x14).unwrap(), 107);
}

#[test]
fn test_aliased_register_numbers() {
    let (mut bus, _, _, addr) = board(false);

    bus.write_word_cmd(addr, 0x08, 0x1234).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x08).unwrap(), 0x1234);
    // Same slot, byte-register shaping
    assert_eq!(bus.read_word_cmd(addr, 0x28).unwrap(), 0x3434);

    // Write rules follow the slot
    bus.write_word_cmd(addr, 0x24, 0xFFFF).unwrap();
    assert_eq!(bus.read_word_cmd(addr, 0x04).unwrap(), 0x9595);
    bus.write_word_cmd(addr, 0x2A, 0x0042).unwrap();
    assert_eq!(bus.read_byte_cmd(addr, 0x13).unwrap(), 0x42);
}
