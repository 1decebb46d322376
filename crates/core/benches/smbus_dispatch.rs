// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use labwired_hwm::bus::Smbus;
use labwired_hwm::device::{self, GL518SM_2D};
use labwired_hwm::peripherals::gl518sm::Gl518sm;
use labwired_hwm::sensors::SharedSensors;

fn criterion_config() -> Criterion {
    match std::env::var("LABWIRED_BENCH_PROFILE").as_deref() {
        Ok("ci") => Criterion::default()
            .warm_up_time(Duration::from_millis(150))
            .measurement_time(Duration::from_millis(400))
            .sample_size(20),
        _ => Criterion::default(),
    }
}

fn board() -> Smbus {
    let mut bus = Smbus::new();
    let sensors = SharedSensors::default();
    device::create(
        &mut bus,
        "hwm",
        &GL518SM_2D,
        &sensors,
        Gl518sm::default_values(2050),
    )
    .unwrap();
    bus
}

fn bench_word_reads(c: &mut Criterion) {
    let mut bus = board();
    c.bench_function("smbus_read_word_all_registers", |b| {
        b.iter(|| {
            let mut acc = 0u16;
            for reg in 0..0x20u8 {
                acc ^= bus.read_word_cmd(black_box(0x2D), reg).unwrap();
            }
            black_box(acc)
        })
    });
}

fn bench_misc_recompute(c: &mut Criterion) {
    let mut bus = board();
    c.bench_function("smbus_write_misc_recompute", |b| {
        let mut misc = 0u8;
        b.iter(|| {
            misc = misc.wrapping_add(0x10);
            bus.write_byte_cmd(0x2D, 0x0F, black_box(misc)).unwrap();
        })
    });
}

fn bench_unbound_nack(c: &mut Criterion) {
    let mut bus = board();
    c.bench_function("smbus_read_unbound", |b| {
        b.iter(|| black_box(bus.read_byte(black_box(0x50)).is_err()))
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_word_reads, bench_misc_recompute, bench_unbound_nack
}
criterion_main!(benches);
