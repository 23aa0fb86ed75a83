//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ocrnav", version, about = "OCR-driven game navigation")]
pub struct Cli {
    /// Path to config TOML; created on first save
    #[arg(long, value_name = "FILE", default_value = "etc/ocrnav.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub sim: SimArgs,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Key layout of the simulated game.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SimLayout {
    /// w walks -z, d walks +x
    Standard,
    /// w walks +x, d walks +z
    Rotated,
}

/// Knobs for the simulated game backend.
#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// Player start position in the simulated world, as "x,y,z"
    #[arg(long = "sim-start", value_name = "X,Y,Z", value_parser = parse_triplet, default_value = "0,5,0", allow_hyphen_values = true)]
    pub start: [f32; 3],

    /// Walking speed in world units per second
    #[arg(long = "sim-speed", value_name = "UPS", default_value_t = 10.0)]
    pub speed: f32,

    /// Fraction of OCR reads that come back garbled (0..=1)
    #[arg(long = "sim-glitch", value_name = "RATE", default_value_t = 0.0)]
    pub glitch: f64,

    /// Fraction of OCR reads that parse but carry a wrong Z value (0..=1)
    #[arg(long = "sim-misread", value_name = "RATE", default_value_t = 0.0)]
    pub misread: f64,

    /// Seed for OCR glitches
    #[arg(long = "sim-seed", value_name = "SEED", default_value_t = 0)]
    pub seed: u64,

    #[arg(long = "sim-layout", value_enum, default_value = "standard")]
    pub layout: SimLayout,

    /// Wait in wall-clock time instead of simulated time
    #[arg(long, action = ArgAction::SetTrue)]
    pub realtime: bool,
}

/// Parse "x,y,z" into three floats.
pub fn parse_triplet(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z but got {s:?}"));
    };
    let num = |v: &str| v.parse::<f32>().map_err(|e| format!("{v:?}: {e}"));
    Ok([num(x)?, num(y)?, num(z)?])
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calibrate if needed, then walk to the target
    Navigate {
        /// Override the configured target x
        #[arg(long, allow_hyphen_values = true)]
        x: Option<f32>,
        /// Override the configured target y
        #[arg(long, allow_hyphen_values = true)]
        y: Option<f32>,
        /// Override the configured target z
        #[arg(long, allow_hyphen_values = true)]
        z: Option<f32>,
        /// Ignore any stored mapping and calibrate first
        #[arg(long, action = ArgAction::SetTrue)]
        recalibrate: bool,
        /// Give up after this many control ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Do not write a learned mapping back to the config
        #[arg(long, action = ArgAction::SetTrue)]
        no_save: bool,
    },
    /// Learn which key moves along which axis and store the mapping
    Calibrate {
        /// Do not write the learned mapping back to the config
        #[arg(long, action = ArgAction::SetTrue)]
        no_save: bool,
    },
    /// Read the HUD once and print the position (OCR test)
    Read,
    /// Store the current position as the navigation target
    SetTarget,
    /// Store the common layout (forward z-, strafe x+, ascend y+) and skip calibration
    Preset,
    /// Store the OCR capture rectangle
    Region {
        #[arg(allow_hyphen_values = true)]
        left: i32,
        #[arg(allow_hyphen_values = true)]
        top: i32,
        width: u32,
        height: u32,
    },
    /// Validate config and perform one simulated read
    SelfCheck,
}
