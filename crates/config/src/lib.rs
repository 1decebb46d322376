// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn check_schema_version(version: &str) -> Result<()> {
    if version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported schema_version '{}'. Supported versions: '{}'",
            version,
            SCHEMA_VERSION
        );
    }
    Ok(())
}

/// Overrides for the platform sensor readings.
///
/// Anything left out keeps the value the chip seeds by default.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    #[serde(default)]
    pub vcore_mv: Option<u32>,
    #[serde(default)]
    pub fans: Option<Vec<u32>>,
    #[serde(default)]
    pub temperatures: Option<Vec<i32>>,
    #[serde(default)]
    pub voltages: Option<Vec<u32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub id: String,
    pub r#type: String, // "gl518sm_2c", "gl518sm_2d"
    /// Overrides the variant's default SMBus address.
    #[serde(default)]
    pub address: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SystemManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl SystemManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read system manifest at {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(yaml).context("Failed to parse System Manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        check_schema_version(&self.schema_version)?;

        let mut seen = HashSet::new();
        for dev in &self.devices {
            if dev.id.trim().is_empty() {
                anyhow::bail!("Device id cannot be empty");
            }
            if !seen.insert(dev.id.as_str()) {
                anyhow::bail!("Duplicate device id '{}'", dev.id);
            }
            if let Some(addr) = dev.address {
                if addr > 0x7F {
                    anyhow::bail!(
                        "Device '{}' address {:#04x} is not a 7-bit SMBus address",
                        dev.id,
                        addr
                    );
                }
            }
            tracing::debug!("Manifest device '{}' ({})", dev.id, dev.r#type);
        }

        Ok(())
    }
}

/// One SMBus transaction in a script.
///
/// Read steps may carry an `expect` value; the runner reports a mismatch as
/// an assertion failure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transaction {
    ReadByte {
        address: u8,
        #[serde(default)]
        expect: Option<u16>,
    },
    ReadByteCmd {
        address: u8,
        cmd: u8,
        #[serde(default)]
        expect: Option<u16>,
    },
    ReadWord {
        address: u8,
        cmd: u8,
        #[serde(default)]
        expect: Option<u16>,
    },
    WriteByte {
        address: u8,
        value: u8,
    },
    WriteByteCmd {
        address: u8,
        cmd: u8,
        value: u8,
    },
    WriteWord {
        address: u8,
        cmd: u8,
        value: u16,
    },
    Remap {
        device: String,
        address: u8,
    },
    SetSensors {
        #[serde(default)]
        fans: Option<Vec<u32>>,
        #[serde(default)]
        temperatures: Option<Vec<i32>>,
        #[serde(default)]
        voltages: Option<Vec<u32>>,
    },
}

impl Transaction {
    pub fn expected(&self) -> Option<u16> {
        match self {
            Transaction::ReadByte { expect, .. }
            | Transaction::ReadByteCmd { expect, .. }
            | Transaction::ReadWord { expect, .. } => *expect,
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TransactionScript {
    pub schema_version: String,
    /// System manifest path, relative to the script.
    #[serde(default)]
    pub system: Option<String>,
    pub steps: Vec<Transaction>,
}

impl TransactionScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open transaction script at {:?}", path.as_ref()))?;
        let script: Self =
            serde_yaml::from_reader(f).context("Failed to parse Transaction Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        check_schema_version(&self.schema_version)?;

        if self.steps.is_empty() {
            anyhow::bail!("Script must contain at least one step");
        }

        if let Some(system) = &self.system {
            if system.trim().is_empty() {
                anyhow::bail!("Input 'system' path cannot be empty");
            }
        }

        Ok(())
    }
}
