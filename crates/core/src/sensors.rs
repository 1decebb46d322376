// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Core voltage reported when the platform does not provide one.
pub const DEFAULT_VCORE_MV: u32 = 2050;

/// Physical readings a hardware monitor samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwmValues {
    /// Revolutions per minute.
    pub fans: Vec<u32>,
    /// Degrees Celsius.
    pub temperatures: Vec<i32>,
    /// Millivolts.
    pub voltages: Vec<u32>,
}

/// Read-only view of the simulated physical world.
///
/// Chip models consult this at reset time and when a register write needs a
/// fresh reading. An index the source does not know reads as 0.
pub trait SensorSource: std::fmt::Debug + Send + Sync {
    fn fan_rpm(&self, index: usize) -> u32;
    fn temperature(&self, index: usize) -> i32;
    fn voltage_mv(&self, index: usize) -> u32;
}

impl SensorSource for HwmValues {
    fn fan_rpm(&self, index: usize) -> u32 {
        self.fans.get(index).copied().unwrap_or(0)
    }

    fn temperature(&self, index: usize) -> i32 {
        self.temperatures.get(index).copied().unwrap_or(0)
    }

    fn voltage_mv(&self, index: usize) -> u32 {
        self.voltages.get(index).copied().unwrap_or(0)
    }
}

/// Platform-wide sensor readings shared between chip models.
///
/// Cloning yields another handle onto the same readings.
#[derive(Debug, Clone, Default)]
pub struct SharedSensors {
    values: Arc<RwLock<HwmValues>>,
}

impl SharedSensors {
    pub fn new(values: HwmValues) -> Self {
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    // A panic while the lock was held leaves the last written readings in
    // place; keep serving them.
    fn read_values(&self) -> RwLockReadGuard<'_, HwmValues> {
        self.values.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Sensor readings lock poisoned; reusing last values");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_values(&self) -> RwLockWriteGuard<'_, HwmValues> {
        self.values.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Sensor readings lock poisoned; reusing last values");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Replace every reading at once.
    pub fn store(&self, values: HwmValues) {
        *self.write_values() = values;
    }

    pub fn update<F: FnOnce(&mut HwmValues)>(&self, f: F) {
        f(&mut *self.write_values());
    }

    pub fn get(&self) -> HwmValues {
        self.read_values().clone()
    }

    pub fn as_source(&self) -> Arc<dyn SensorSource> {
        Arc::new(self.clone())
    }
}

impl SensorSource for SharedSensors {
    fn fan_rpm(&self, index: usize) -> u32 {
        self.read_values().fan_rpm(index)
    }

    fn temperature(&self, index: usize) -> i32 {
        self.read_values().temperature(index)
    }

    fn voltage_mv(&self, index: usize) -> u32 {
        self.read_values().voltage_mv(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_index_reads_zero() {
        let v = HwmValues {
            fans: vec![1200],
            temperatures: vec![],
            voltages: vec![3300],
        };
        assert_eq!(v.fan_rpm(0), 1200);
        assert_eq!(v.fan_rpm(1), 0);
        assert_eq!(v.temperature(0), 0);
        assert_eq!(v.voltage_mv(2), 0);
    }

    #[test]
    fn test_shared_handles_see_updates() {
        let a = SharedSensors::new(HwmValues {
            fans: vec![3000, 3000],
            ..Default::default()
        });
        let b = a.clone();
        let source = a.as_source();

        b.update(|v| v.fans[1] = 4500);

        assert_eq!(a.fan_rpm(1), 4500);
        assert_eq!(source.fan_rpm(1), 4500);
        assert_eq!(source.fan_rpm(0), 3000);
    }

    #[test]
    fn test_store_replaces_everything() {
        let s = SharedSensors::default();
        s.store(HwmValues {
            fans: vec![1],
            temperatures: vec![-5],
            voltages: vec![12000],
        });
        assert_eq!(s.temperature(0), -5);
        assert_eq!(s.get().voltages, vec![12000]);
    }

    #[test]
    fn test_writes_survive_poisoned_lock() {
        let s = SharedSensors::new(HwmValues {
            fans: vec![3000, 3000],
            ..Default::default()
        });
        let writer = s.clone();
        let result = std::thread::spawn(move || {
            writer.update(|v| {
                v.fans[0] = 1000;
                panic!("platform model crashed mid-update");
            })
        })
        .join();
        assert!(result.is_err());

        assert_eq!(s.fan_rpm(0), 1000);
        s.update(|v| v.fans[1] = 4500);
        assert_eq!(s.fan_rpm(1), 4500);
        s.store(HwmValues::default());
        assert_eq!(s.get(), HwmValues::default());
    }
}
