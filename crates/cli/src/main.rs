// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info};

use labwired_hwm::bus::Smbus;
use labwired_hwm::peripherals::gl518sm::registers::REGISTER_MAP;
use labwired_hwm::peripherals::gl518sm::Gl518sm;
use labwired_hwm::sensors::SharedSensors;
use labwired_hwm::snapshot::SmbusSnapshot;
use labwired_hwm::SMBUS_ADDR_MAX;
use labwired_hwm_config::{SystemManifest, Transaction, TransactionScript};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

fn parse_smbus_addr(s: &str) -> Result<u8, String> {
    let trimmed = s.trim();
    let addr = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex address '{}': {}", s, e))?
    } else {
        u8::from_str(trimmed).map_err(|e| format!("Invalid address '{}': {}", s, e))?
    };
    if addr > SMBUS_ADDR_MAX {
        return Err(format!("Address '{}' is not a 7-bit SMBus address", s));
    }
    Ok(addr)
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LabWired hardware monitor simulator",
    long_about = None
)]
struct Cli {
    /// Log every register access
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the register file of every chip on a board.
    Dump(DumpArgs),

    /// Drive a board with a transaction script (YAML) and check expectations.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Path to the system manifest (YAML)
    #[arg(short = 's', long)]
    system: PathBuf,

    /// Only dump the chip answering at this address
    #[arg(long, value_parser = parse_smbus_addr)]
    address: Option<u8>,

    /// Print the bus snapshot as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the transaction script (YAML)
    #[arg(short = 'c', long)]
    script: PathBuf,

    /// Path to the system manifest (YAML); overrides the script's `system`
    #[arg(short = 's', long)]
    system: Option<PathBuf>,

    /// Restore a bus snapshot (JSON) before the first step
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Write the bus snapshot (JSON) after the last step
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Directory to write run artifacts (result.json)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunResult {
    result_schema_version: String,
    status: String,
    steps_executed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    assertions: Vec<AssertionResult>,
    config: RunConfig,
}

#[derive(Debug, Serialize)]
struct AssertionResult {
    step: usize,
    transaction: Transaction,
    expected: u16,
    actual: u16,
    passed: bool,
}

#[derive(Debug, Serialize)]
struct RunConfig {
    script: PathBuf,
    system: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dump(args) => run_dump(args),
        Commands::Run(args) => run_script(args),
    }
}

fn load_board(path: &Path) -> Result<(Smbus, SharedSensors)> {
    let manifest = SystemManifest::from_file(path)?;
    info!("Loading board '{}' from {:?}", manifest.name, path);
    Smbus::from_config(&manifest)
}

fn run_dump(args: DumpArgs) -> ExitCode {
    let (bus, _sensors) = match load_board(&args.system) {
        Ok(board) => board,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if let Some(addr) = args.address {
        if bus.device_at(addr).is_none() {
            error!("No device at SMBus {:02X}h", addr);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    let selected = |address: Option<u8>| args.address.is_none() || address == args.address;

    if args.json {
        let mut snapshot = bus.snapshot();
        snapshot.devices.retain(|_, dev| selected(dev.address));
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize snapshot: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
        return ExitCode::from(EXIT_PASS);
    }

    for (id, entry) in bus.entries() {
        if !selected(entry.address) {
            continue;
        }
        let Some(chip) = bus.device::<Gl518sm>(id) else {
            continue;
        };

        match entry.address {
            Some(addr) => println!("{} @ {:02X}h", entry.name, addr),
            None => println!("{} (unbound)", entry.name),
        }
        for (reg, def) in REGISTER_MAP.iter().enumerate() {
            println!(
                "  {:02X}  {:<10}  {:04X}",
                reg,
                def.name,
                chip.registers().read(reg as u8)
            );
        }
    }

    ExitCode::from(EXIT_PASS)
}

fn read_snapshot(path: &Path) -> Result<SmbusSnapshot> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("Failed to open snapshot at {:?}", path))?;
    serde_json::from_reader(f).with_context(|| format!("Failed to parse snapshot {:?}", path))
}

fn write_snapshot(path: &Path, bus: &Smbus, sensors: &SharedSensors) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot parent dir {:?}", parent))?;
    }

    let mut snapshot = bus.snapshot();
    snapshot.sensors = Some(sensors.get());

    let f = std::fs::File::create(path)
        .with_context(|| format!("Failed to create snapshot {:?}", path))?;
    serde_json::to_writer_pretty(f, &snapshot)
        .with_context(|| format!("Failed to write snapshot {:?}", path))
}

fn write_result(dir: &Path, result: &RunResult) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        error!("Failed to create output dir {:?}: {}", dir, e);
        return;
    }
    let path = dir.join("result.json");
    match std::fs::File::create(&path) {
        Ok(f) => {
            if let Err(e) = serde_json::to_writer_pretty(f, result) {
                error!("Failed to write {:?}: {}", path, e);
            }
        }
        Err(e) => error!("Failed to create {:?}: {}", path, e),
    }
}

/// Run one step. Read steps return the value seen on the bus.
fn execute(bus: &mut Smbus, sensors: &SharedSensors, step: &Transaction) -> Result<Option<u16>> {
    let value = match step {
        Transaction::ReadByte { address, .. } => Some(bus.read_byte(*address)? as u16),
        Transaction::ReadByteCmd { address, cmd, .. } => {
            Some(bus.read_byte_cmd(*address, *cmd)? as u16)
        }
        Transaction::ReadWord { address, cmd, .. } => Some(bus.read_word_cmd(*address, *cmd)?),
        Transaction::WriteByte { address, value } => {
            bus.write_byte(*address, *value)?;
            None
        }
        Transaction::WriteByteCmd {
            address,
            cmd,
            value,
        } => {
            bus.write_byte_cmd(*address, *cmd, *value)?;
            None
        }
        Transaction::WriteWord {
            address,
            cmd,
            value,
        } => {
            bus.write_word_cmd(*address, *cmd, *value)?;
            None
        }
        Transaction::Remap { device, address } => {
            let id = bus
                .find(device)
                .ok_or_else(|| anyhow::anyhow!("No device named '{}'", device))?;
            bus.remap(id, *address)?;
            None
        }
        Transaction::SetSensors {
            fans,
            temperatures,
            voltages,
        } => {
            sensors.update(|v| {
                if let Some(fans) = fans {
                    v.fans = fans.clone();
                }
                if let Some(temperatures) = temperatures {
                    v.temperatures = temperatures.clone();
                }
                if let Some(voltages) = voltages {
                    v.voltages = voltages.clone();
                }
            });
            None
        }
    };
    Ok(value)
}

fn run_script(args: RunArgs) -> ExitCode {
    let script = match TransactionScript::from_file(&args.script) {
        Ok(s) => s,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    // Script-relative system path, unless overridden on the command line
    let system_path = args.system.clone().or_else(|| {
        script.system.as_ref().map(|s| {
            args.script
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(s)
        })
    });

    let mut result = RunResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: "error".to_string(),
        steps_executed: 0,
        message: None,
        assertions: Vec::new(),
        config: RunConfig {
            script: args.script.clone(),
            system: system_path.clone(),
        },
    };

    let Some(system_path) = system_path else {
        let msg = "Missing system manifest: pass --system or set 'system' in the script";
        error!("{}", msg);
        result.message = Some(msg.to_string());
        if let Some(dir) = &args.output_dir {
            write_result(dir, &result);
        }
        return ExitCode::from(EXIT_CONFIG_ERROR);
    };

    let (mut bus, sensors) = match load_board(&system_path) {
        Ok(board) => board,
        Err(e) => {
            error!("{:#}", e);
            result.message = Some(format!("{:#}", e));
            if let Some(dir) = &args.output_dir {
                write_result(dir, &result);
            }
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if let Some(path) = &args.restore {
        let restored = read_snapshot(path).and_then(|snap| {
            bus.apply_snapshot(&snap)?;
            if let Some(values) = snap.sensors {
                sensors.store(values);
            }
            Ok(())
        });
        if let Err(e) = restored {
            error!("{:#}", e);
            result.message = Some(format!("{:#}", e));
            if let Some(dir) = &args.output_dir {
                write_result(dir, &result);
            }
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
        info!("Restored bus state from {:?}", path);
    }

    for (index, step) in script.steps.iter().enumerate() {
        match execute(&mut bus, &sensors, step) {
            Ok(actual) => {
                result.steps_executed += 1;
                if let (Some(actual), Some(expected)) = (actual, step.expected()) {
                    let passed = actual == expected;
                    if !passed {
                        error!(
                            "Step {}: expected {:#06x}, got {:#06x}",
                            index, expected, actual
                        );
                    }
                    result.assertions.push(AssertionResult {
                        step: index,
                        transaction: step.clone(),
                        expected,
                        actual,
                        passed,
                    });
                }
            }
            Err(e) => {
                let msg = format!("Step {}: {:#}", index, e);
                error!("{}", msg);
                result.message = Some(msg);
                if let Some(dir) = &args.output_dir {
                    write_result(dir, &result);
                }
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    }

    if let Some(path) = &args.snapshot {
        if let Err(e) = write_snapshot(path, &bus, &sensors) {
            error!("{:#}", e);
            result.message = Some(format!("{:#}", e));
            if let Some(dir) = &args.output_dir {
                write_result(dir, &result);
            }
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    let failed = result.assertions.iter().filter(|a| !a.passed).count();
    info!(
        "{} steps, {} assertions, {} failed",
        result.steps_executed,
        result.assertions.len(),
        failed
    );

    result.status = if failed == 0 { "pass" } else { "fail" }.to_string();
    if let Some(dir) = &args.output_dir {
        write_result(dir, &result);
    }

    if failed == 0 {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_ASSERT_FAIL)
    }
}
