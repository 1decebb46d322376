// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::sensors::HwmValues;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SmbusSnapshot {
    pub devices: BTreeMap<String, DeviceSnapshot>,
    /// Platform readings at snapshot time, when the caller has them.
    #[serde(default)]
    pub sensors: Option<HwmValues>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceSnapshot {
    pub address: Option<u8>,
    pub state: serde_json::Value,
}
