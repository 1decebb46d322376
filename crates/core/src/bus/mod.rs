// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::device;
use crate::sensors::SharedSensors;
use crate::snapshot::{DeviceSnapshot, SmbusSnapshot};
use crate::{SimResult, SimulationError, SmbusDevice, SMBUS_ADDR_MAX, SMBUS_UNBOUND};
use anyhow::Context;
use labwired_hwm_config::SystemManifest;

const ADDRESS_SLOTS: usize = SMBUS_ADDR_MAX as usize + 1;

/// Stable handle for a device attached to an [`Smbus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(usize);

impl DeviceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct SmbusEntry {
    pub name: String,
    /// `None` while the device is not answering on the bus.
    pub address: Option<u8>,
    pub dev: Box<dyn SmbusDevice>,
}

/// In-process SMBus segment.
///
/// Devices are owned by the bus and reached through a 128-entry address
/// table. One device answers per address. All rebinding happens inside a
/// single `&mut self` call, so a transaction can never see a device bound
/// twice or caught between addresses.
#[derive(Debug)]
pub struct Smbus {
    entries: Vec<Option<SmbusEntry>>,
    handlers: [Option<DeviceId>; ADDRESS_SLOTS],
}

impl Default for Smbus {
    fn default() -> Self {
        Self::new()
    }
}

impl Smbus {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            handlers: [None; ADDRESS_SLOTS],
        }
    }

    /// Build the bus described by a system manifest.
    ///
    /// Returns the platform sensor readings the devices were seeded with.
    pub fn from_config(manifest: &SystemManifest) -> anyhow::Result<(Self, SharedSensors)> {
        let sensors = SharedSensors::default();
        let mut bus = Self::new();

        for dev_cfg in &manifest.devices {
            let Some(info) = device::lookup(&dev_cfg.r#type) else {
                tracing::warn!(
                    "Unsupported device type '{}' for id '{}'; skipping",
                    dev_cfg.r#type,
                    dev_cfg.id
                );
                continue;
            };

            let info = match dev_cfg.address {
                Some(addr) => info.at(addr),
                None => *info,
            };
            let seed = info.seed(&manifest.sensors);

            device::create(&mut bus, &dev_cfg.id, &info, &sensors, seed)
                .with_context(|| format!("Failed to create device '{}'", dev_cfg.id))?;
        }

        Ok((bus, sensors))
    }

    /// Take ownership of a device. It stays unbound until [`Smbus::remap`].
    pub fn attach(&mut self, name: &str, dev: Box<dyn SmbusDevice>) -> SimResult<DeviceId> {
        self.entries
            .try_reserve(1)
            .map_err(|_| SimulationError::OutOfResources(name.to_string()))?;

        let id = DeviceId(self.entries.len());
        self.entries.push(Some(SmbusEntry {
            name: name.to_string(),
            address: None,
            dev,
        }));
        Ok(id)
    }

    /// Unbind and remove a device.
    pub fn detach(&mut self, id: DeviceId) -> SimResult<SmbusEntry> {
        self.remap(id, SMBUS_UNBOUND)?;
        self.entries
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(SimulationError::UnknownDevice(id.0))
    }

    /// Move a device to `addr`, or unbind it when `addr` is not a 7-bit
    /// address. Returns where the device ended up.
    ///
    /// A target address already held by another device is refused and the
    /// device is left unbound.
    pub fn remap(&mut self, id: DeviceId, addr: u8) -> SimResult<Option<u8>> {
        let entry = self
            .entries
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SimulationError::UnknownDevice(id.0))?;

        tracing::info!("{}: remapping to SMBus {:02X}h", entry.name, addr);

        if let Some(old) = entry.address.take() {
            self.handlers[old as usize] = None;
        }

        if addr <= SMBUS_ADDR_MAX {
            match self.handlers[addr as usize] {
                Some(other) if other != id => {
                    tracing::warn!(
                        "{}: SMBus {:02X}h already claimed by device #{}; staying unbound",
                        entry.name,
                        addr,
                        other.0
                    );
                }
                _ => {
                    self.handlers[addr as usize] = Some(id);
                    entry.address = Some(addr);
                }
            }
        }

        Ok(entry.address)
    }

    pub fn address_of(&self, id: DeviceId) -> Option<u8> {
        self.entry(id).and_then(|e| e.address)
    }

    pub fn device_at(&self, addr: u8) -> Option<DeviceId> {
        self.handlers.get(addr as usize).copied().flatten()
    }

    pub fn entry(&self, id: DeviceId) -> Option<&SmbusEntry> {
        self.entries.get(id.0).and_then(Option::as_ref)
    }

    pub fn entries(&self) -> impl Iterator<Item = (DeviceId, &SmbusEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (DeviceId(i), e)))
    }

    pub fn find(&self, name: &str) -> Option<DeviceId> {
        self.entries()
            .find(|(_, e)| e.name == name)
            .map(|(id, _)| id)
    }

    pub fn device<T: 'static>(&self, id: DeviceId) -> Option<&T> {
        self.entry(id)?.dev.as_any()?.downcast_ref::<T>()
    }

    pub fn device_mut<T: 'static>(&mut self, id: DeviceId) -> Option<&mut T> {
        self.entries
            .get_mut(id.0)?
            .as_mut()?
            .dev
            .as_any_mut()?
            .downcast_mut::<T>()
    }

    fn target(&mut self, addr: u8) -> SimResult<&mut dyn SmbusDevice> {
        let id = self.device_at(addr).ok_or(SimulationError::NoDevice(addr))?;
        match self.entries.get_mut(id.0).and_then(Option::as_mut) {
            Some(entry) => Ok(&mut *entry.dev),
            None => Err(SimulationError::NoDevice(addr)),
        }
    }

    pub fn read_byte(&mut self, addr: u8) -> SimResult<u8> {
        Ok(self.target(addr)?.read_byte())
    }

    pub fn read_byte_cmd(&mut self, addr: u8, cmd: u8) -> SimResult<u8> {
        Ok(self.target(addr)?.read_byte_cmd(cmd))
    }

    pub fn read_word_cmd(&mut self, addr: u8, cmd: u8) -> SimResult<u16> {
        Ok(self.target(addr)?.read_word_cmd(cmd))
    }

    pub fn write_byte(&mut self, addr: u8, val: u8) -> SimResult<()> {
        self.target(addr)?.write_byte(val);
        Ok(())
    }

    pub fn write_byte_cmd(&mut self, addr: u8, cmd: u8, val: u8) -> SimResult<()> {
        self.target(addr)?.write_byte_cmd(cmd, val);
        Ok(())
    }

    pub fn write_word_cmd(&mut self, addr: u8, cmd: u8, val: u16) -> SimResult<()> {
        self.target(addr)?.write_word_cmd(cmd, val);
        Ok(())
    }

    pub fn snapshot(&self) -> SmbusSnapshot {
        SmbusSnapshot {
            devices: self
                .entries()
                .map(|(_, e)| {
                    (
                        e.name.clone(),
                        DeviceSnapshot {
                            address: e.address,
                            state: e.dev.snapshot(),
                        },
                    )
                })
                .collect(),
            sensors: None,
        }
    }

    /// Restore device state and address bindings by device name.
    pub fn apply_snapshot(&mut self, snapshot: &SmbusSnapshot) -> SimResult<()> {
        for name in snapshot.devices.keys() {
            if self.find(name).is_none() {
                tracing::warn!("Snapshot device '{}' is not attached; ignoring", name);
            }
        }

        // Every device must accept its state before any binding moves.
        let mut restored: Vec<(usize, serde_json::Value)> = Vec::new();
        let mut failure = None;
        for (index, slot) in self.entries.iter_mut().enumerate() {
            let Some(entry) = slot.as_mut() else {
                continue;
            };
            let Some(saved) = snapshot.devices.get(&entry.name) else {
                continue;
            };
            let previous = entry.dev.snapshot();
            match entry.dev.restore(saved.state.clone()) {
                Ok(()) => restored.push((index, previous)),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            for (index, previous) in restored {
                if let Some(entry) = self.entries.get_mut(index).and_then(Option::as_mut) {
                    if let Err(e) = entry.dev.restore(previous) {
                        tracing::warn!("{}: rollback failed: {}", entry.name, e);
                    }
                }
            }
            return Err(err);
        }

        let bindings: Vec<(DeviceId, Option<u8>)> = self
            .entries()
            .map(|(id, e)| {
                let addr = snapshot
                    .devices
                    .get(&e.name)
                    .map_or(e.address, |saved| saved.address);
                (id, addr)
            })
            .collect();

        // Unbind everything first so bindings can swap addresses.
        for &(id, _) in &bindings {
            self.remap(id, SMBUS_UNBOUND)?;
        }
        for (id, addr) in bindings {
            self.remap(id, addr.unwrap_or(SMBUS_UNBOUND))?;
        }

        Ok(())
    }
}
