//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use mutatio_designspace::AxisValue;
use mutatio_varmodel::{ModelOptions, Strategy};

use crate::{
    commands::{default_source, factors, inspect, normalize, roundtrip, rules},
    io::parse_axis_value,
};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

pub fn init_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER)).init();
}

#[derive(Parser)]
#[command(name = "mutatio")]
#[command(about = "Inspect, normalize and query designspace documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    #[default]
    Mutator,
    Supports,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Mutator => Strategy::Mutator,
            StrategyArg::Supports => Strategy::Supports,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print axes, sources, instances, rules and the default source.
    Inspect {
        /// Designspace files, or directories to search for them.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Rewrite a document into normalized coordinates.
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Read a document and write it back unchanged.
    Roundtrip {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Report which source each document treats as its default.
    Default {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Apply the substitution rules to glyph names at a location.
    Rules {
        input: PathBuf,
        /// Axis coordinate as `name=value`, or `name=x,y` for anisotropic values.
        #[arg(long = "at", value_name = "AXIS=VALUE", value_parser = parse_axis_value)]
        at: Vec<(String, AxisValue)>,
        #[arg(required = true)]
        glyphs: Vec<String>,
    },
    /// Print the weight of every source at a location.
    Factors {
        input: PathBuf,
        #[arg(long = "at", value_name = "AXIS=VALUE", value_parser = parse_axis_value)]
        at: Vec<(String, AxisValue)>,
        #[arg(long, value_enum, default_value_t)]
        strategy: StrategyArg,
        /// Clamp locations outside the masters instead of extrapolating.
        #[arg(long)]
        no_extrapolate: bool,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Inspect { paths } => inspect(&paths),
            Commands::Normalize { input, output } => normalize(&input, &output),
            Commands::Roundtrip { input, output } => roundtrip(&input, &output),
            Commands::Default { paths } => default_source(&paths),
            Commands::Rules { input, at, glyphs } => rules(&input, at, &glyphs),
            Commands::Factors { input, at, strategy, no_extrapolate } => {
                let options = ModelOptions::new().strategy(strategy.into()).extrapolate(!no_extrapolate);
                factors(&input, at, options)
            }
        }
    }
}
