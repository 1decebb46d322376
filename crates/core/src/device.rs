// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::{DeviceId, Smbus};
use crate::peripherals::gl518sm::Gl518sm;
use crate::sensors::{HwmValues, SensorSource, SharedSensors, DEFAULT_VCORE_MV};
use crate::{SimResult, SmbusDevice, SMBUS_ADDR_MAX};
use labwired_hwm_config::SensorConfig;
use std::sync::Arc;

/// Static description of an attachable chip variant.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub name: &'static str,
    /// Default SMBus address.
    pub local: u8,
    /// Readings the chip seeds into the platform sensors, given a Vcore.
    pub defaults: fn(u32) -> HwmValues,
    pub init: fn(Arc<dyn SensorSource>) -> Box<dyn SmbusDevice>,
}

impl DeviceInfo {
    /// Chip defaults with manifest overrides applied on top.
    pub fn seed(&self, overrides: &SensorConfig) -> HwmValues {
        let mut values = (self.defaults)(overrides.vcore_mv.unwrap_or(DEFAULT_VCORE_MV));
        if let Some(fans) = &overrides.fans {
            values.fans = fans.clone();
        }
        if let Some(temperatures) = &overrides.temperatures {
            values.temperatures = temperatures.clone();
        }
        if let Some(voltages) = &overrides.voltages {
            values.voltages = voltages.clone();
        }
        values
    }

    pub fn at(&self, local: u8) -> Self {
        Self { local, ..*self }
    }
}

fn gl518sm_init(sensors: Arc<dyn SensorSource>) -> Box<dyn SmbusDevice> {
    Box::new(Gl518sm::new(sensors))
}

/// GL518SM on SMBus address 2Ch
pub static GL518SM_2C: DeviceInfo = DeviceInfo {
    name: "Genesys Logic GL518SM Hardware Monitor",
    local: 0x2C,
    defaults: Gl518sm::default_values,
    init: gl518sm_init,
};

/// GL518SM on SMBus address 2Dh
pub static GL518SM_2D: DeviceInfo = DeviceInfo {
    name: "Genesys Logic GL518SM Hardware Monitor",
    local: 0x2D,
    defaults: Gl518sm::default_values,
    init: gl518sm_init,
};

/// Resolve a manifest device type.
pub fn lookup(kind: &str) -> Option<&'static DeviceInfo> {
    match kind {
        "gl518sm_2c" => Some(&GL518SM_2C),
        "gl518sm_2d" => Some(&GL518SM_2D),
        _ => None,
    }
}

/// Bring up one chip: seed the platform readings, power the chip up (which
/// runs its reset), then bind it at `info.local`.
pub fn create(
    bus: &mut Smbus,
    name: &str,
    info: &DeviceInfo,
    sensors: &SharedSensors,
    seed: HwmValues,
) -> SimResult<DeviceId> {
    sensors.store(seed);

    let dev = (info.init)(sensors.as_source());
    let id = bus.attach(name, dev)?;
    bus.remap(id, info.local & SMBUS_ADDR_MAX)?;

    tracing::info!(
        "Attached {} as '{}' at SMBus {:02X}h",
        info.name,
        name,
        info.local & SMBUS_ADDR_MAX
    );
    Ok(id)
}

/// Unbind from the bus, then hand the chip back to the caller to drop.
///
/// [`Smbus::detach`] remaps to [`crate::SMBUS_UNBOUND`] before releasing the entry.
pub fn destroy(bus: &mut Smbus, id: DeviceId) -> SimResult<Box<dyn SmbusDevice>> {
    let entry = bus.detach(id)?;
    tracing::info!("Detached '{}'", entry.name);
    Ok(entry.dev)
}
