//! CLI entry point for Kinesis K-Cube DC servo controllers
//!
//! Thin command-line front end over the library. Every command opens the
//! device it names, performs one operation, and closes it again.
//!
//! # Usage
//!
//! ```bash
//! kinesis list --type 27
//! kinesis move 27000001 12.5 --real
//! kinesis params 27000001 homing
//! kinesis set-params 27000001 jog stepSize=2048 velParams.maxVelocity=5000
//! kinesis --mock position 83000001
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kinesis_motion::{
    library, logging, BlockKind, FieldValue, Kinesis, KinesisConfig, KinesisError, ParamDict,
    StatusLookup, StopMode, UnitType,
};

#[derive(Parser)]
#[command(name = "kinesis")]
#[command(about = "Control Thorlabs K-Cube DC servo controllers", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = kinesis_motion::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Vendor library, overriding `library.path` from the configuration
    #[arg(short, long, global = true)]
    library: Option<PathBuf>,

    /// Use the in-process simulated controllers instead of the vendor library
    #[cfg(feature = "mock")]
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected devices
    List {
        /// Only devices of this type id (27 = K-Cube DC servo)
        #[arg(long = "type")]
        type_id: Option<i32>,
    },

    /// Show device and hardware information
    Info { serial: String },

    /// Flash the front-panel display
    Identify { serial: String },

    /// Start homing
    Home { serial: String },

    /// Start a move to an absolute position
    Move {
        serial: String,
        /// Target, in device units unless --real is given
        #[arg(allow_negative_numbers = true)]
        position: f64,
        /// Interpret the position in real units (mm or degrees)
        #[arg(long)]
        real: bool,
    },

    /// Stop the current move
    Stop {
        serial: String,
        /// Stop at once instead of decelerating
        #[arg(long)]
        immediate: bool,
    },

    /// Print the last reported position
    Position {
        serial: String,
        /// Print in real units
        #[arg(long)]
        real: bool,
    },

    /// Print parameter blocks as JSON
    Params {
        serial: String,
        /// One block; all blocks when omitted
        block: Option<BlockKind>,
    },

    /// Assign fields of a parameter block
    SetParams {
        serial: String,
        block: BlockKind,
        /// `field=value` pairs; nested fields as `velParams.maxVelocity=5000`
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Write the current settings to the controller's memory
    Persist { serial: String },
}

fn main() {
    let cli = Cli::parse();
    let config = match KinesisConfig::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Error: {}", e);
    }

    if let Err(e) = run(cli, &config) {
        eprintln!("Error: {:#}", e);
        let vendor_code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<KinesisError>())
            .and_then(KinesisError::vendor_code);
        if let Some(code) = vendor_code {
            if let Some(text) = config.status_table().describe(code) {
                eprintln!("  status {}: {}", code, text);
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &KinesisConfig) -> Result<()> {
    config.validate()?;
    let kinesis = connect(&cli, config)?;

    match cli.command {
        Commands::List { type_id } => {
            kinesis.build_device_list()?;
            let serials = match type_id {
                Some(id) => kinesis.device_list_by_type(id)?,
                None => kinesis.device_list()?,
            };
            for serial in serials {
                let info = kinesis.device_info(&serial)?;
                println!("{}\t{}", serial, info.description);
            }
        }
        Commands::Info { serial } => {
            kinesis.build_device_list()?;
            let info = kinesis.device_info(&serial)?;
            let stage = kinesis.open(&serial)?;
            let hardware = stage.hardware_info()?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            println!("{}", serde_json::to_string_pretty(&hardware)?);
            println!("firmware {}", hardware.firmware_version_string());
            stage.close()?;
        }
        Commands::Identify { serial } => {
            let stage = open(kinesis, &serial)?;
            stage.identify();
            stage.close()?;
        }
        Commands::Home { serial } => {
            let stage = open(kinesis, &serial)?;
            if !stage.can_home() {
                bail!("device {} cannot home", serial);
            }
            stage.home()?;
            stage.close()?;
        }
        Commands::Move {
            serial,
            position,
            real,
        } => {
            let stage = open(kinesis, &serial)?;
            let target = if real {
                stage.device_unit_from_real_value(position, UnitType::Distance)?
            } else {
                device_units(position)?
            };
            stage.move_to_position(target)?;
            println!("moving {} to {}", serial, target);
            stage.close()?;
        }
        Commands::Stop { serial, immediate } => {
            let stage = open(kinesis, &serial)?;
            let mode = if immediate {
                StopMode::Immediate
            } else {
                StopMode::Profiled
            };
            stage.stop(mode)?;
            stage.close()?;
        }
        Commands::Position { serial, real } => {
            let stage = open(kinesis, &serial)?;
            stage.request_position()?;
            let position = stage.position();
            if real {
                let value = stage.real_value_from_device_unit(position, UnitType::Distance)?;
                println!("{}", value);
            } else {
                println!("{}", position);
            }
            stage.close()?;
        }
        Commands::Params { serial, block } => {
            let stage = open(kinesis, &serial)?;
            let kinds = match block {
                Some(kind) => vec![kind],
                None => BlockKind::ALL.to_vec(),
            };
            let mut dump = BTreeMap::new();
            for kind in kinds {
                let dict = stage
                    .block_dict(kind)
                    .with_context(|| format!("reading {} parameters", kind))?;
                dump.insert(kind.name(), dict);
            }
            println!("{}", serde_json::to_string_pretty(&dump)?);
            stage.close()?;
        }
        Commands::SetParams {
            serial,
            block,
            assignments,
        } => {
            let dict = parse_assignments(&assignments)?;
            let stage = open(kinesis, &serial)?;
            stage
                .apply_block_dict(block, &dict)
                .with_context(|| format!("writing {} parameters", block))?;
            println!("{}", serde_json::to_string_pretty(&stage.block_dict(block)?)?);
            stage.close()?;
        }
        Commands::Persist { serial } => {
            let stage = open(kinesis, &serial)?;
            stage.persist_settings()?;
            stage.close()?;
        }
    }

    Ok(())
}

fn connect(cli: &Cli, config: &KinesisConfig) -> Result<Kinesis> {
    #[cfg(feature = "mock")]
    if cli.mock {
        use kinesis_motion::mock::{self, MockDevice};

        if config.devices.is_empty() {
            mock::attach("83000001", MockDevice::default());
        }
        for device in &config.devices {
            mock::attach(&device.serial, MockDevice::default());
        }
        return Ok(library::install(mock::new_library())?);
    }

    let path = cli.library.as_ref().unwrap_or(&config.library.path);
    library::init(path).with_context(|| format!("loading {}", path.display()))
}

fn open(kinesis: Kinesis, serial: &str) -> Result<kinesis_motion::KCubeDcServo> {
    kinesis.build_device_list()?;
    kinesis
        .open(serial)
        .with_context(|| format!("opening device {}", serial))
}

fn device_units(position: f64) -> Result<i32> {
    if position.fract() != 0.0 || position < f64::from(i32::MIN) || position > f64::from(i32::MAX) {
        bail!("{} is not a whole number of device units; pass --real for real units", position);
    }
    Ok(position as i32)
}

/// Turn `a=1 b.c=2` into a (possibly nested) parameter dictionary.
fn parse_assignments(assignments: &[String]) -> Result<ParamDict> {
    let mut dict = ParamDict::new();
    for assignment in assignments {
        let (path, raw) = assignment
            .split_once('=')
            .with_context(|| format!("'{}' is not of the form field=value", assignment))?;
        let value = serde_json::from_str::<FieldValue>(raw.trim())
            .unwrap_or_else(|_| FieldValue::parse_scalar(raw));

        let mut keys: Vec<&str> = path.trim().split('.').collect();
        let Some(leaf) = keys.pop().filter(|k| !k.is_empty()) else {
            bail!("'{}' has an empty field name", assignment);
        };
        let mut table = &mut dict;
        for key in keys {
            let entry = table
                .entry(key.to_string())
                .or_insert_with(|| FieldValue::Table(ParamDict::new()));
            table = match entry {
                FieldValue::Table(inner) => inner,
                _ => bail!("'{}' is both a value and a nested block", key),
            };
        }
        table.insert(leaf.to_string(), value);
    }
    Ok(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments_nested() {
        let dict = parse_assignments(&[
            "stepSize=2048".to_string(),
            "velParams.maxVelocity=5000".to_string(),
            "velParams.acceleration=4.5".to_string(),
        ])
        .unwrap();

        assert_eq!(dict["stepSize"], FieldValue::Int(2048));
        let FieldValue::Table(inner) = &dict["velParams"] else {
            panic!("velParams should be a table");
        };
        assert_eq!(inner["maxVelocity"], FieldValue::Int(5000));
        assert_eq!(inner["acceleration"], FieldValue::Float(4.5));
    }

    #[test]
    fn test_parse_assignments_lists_and_errors() {
        let dict = parse_assignments(&["reserved=[1,2,3,4,5,6]".to_string()]).unwrap();
        assert!(matches!(&dict["reserved"], FieldValue::List(items) if items.len() == 6));

        assert!(parse_assignments(&["stepSize".to_string()]).is_err());
        assert!(parse_assignments(&["a=1".to_string(), "a.b=2".to_string()]).is_err());
    }

    #[test]
    fn test_device_units_must_be_whole() {
        assert_eq!(device_units(-2048.0).unwrap(), -2048);
        assert!(device_units(1.5).is_err());
        assert!(device_units(1e12).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["kinesis", "move", "27000001", "-12.5", "--real"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Move { real: true, position, .. } if position == -12.5
        ));

        let cli = Cli::try_parse_from(["kinesis", "params", "27000001", "limit-switch"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Params { block: Some(BlockKind::LimitSwitch), .. }
        ));
    }
}
