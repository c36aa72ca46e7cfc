//! Tether CLI: rewires the probes of an inserted debug core to new nets.
//!
//! Given the routed checkpoint of a user design, `tether` inserts a debug
//! core (through the configured vendor toolchain) on the first run and
//! reuses it on later runs, so that changing which nets are probed only
//! costs a local reroute instead of a full implementation pass.

#![warn(missing_docs)]

mod build;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Tether: incremental debug-probe rewiring.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about = "Incremental debug-probe rewiring for routed FPGA designs")]
pub struct Cli {
    /// Routed design checkpoint, usually `<design>_wrapper_routed.dcp`.
    pub input_dcp: PathBuf,

    /// Name of the rewired output checkpoint [default: `<design>_probes.dcp`].
    pub output_dcp: Option<PathBuf>,

    /// Insert probes using the mappings in this file.
    #[arg(short = 'i', long)]
    pub input_probes: Option<PathBuf>,

    /// Write probe mappings to this file.
    #[arg(short = 'o', long)]
    pub output_probes: Option<PathBuf>,

    /// Directory for intermediate designs and metadata.
    #[arg(short = 'd', long, alias = "iii-dir")]
    pub work_dir: Option<PathBuf>,

    /// Insert this many probe wires. Ignored if smaller than the probe map.
    #[arg(short = 'p', long)]
    pub probe_count: Option<u32>,

    /// Sample depth of the debug core.
    #[arg(short = 'P', long)]
    pub probe_depth: Option<u32>,

    /// Net that clocks the debug core.
    #[arg(short = 'c', long)]
    pub clk_net: Option<String>,

    /// Rebuild from the input checkpoint, ignoring intermediate designs.
    #[arg(short, long)]
    pub refresh: bool,

    /// Overwrite existing output files.
    #[arg(short, long)]
    pub force: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Show progress (`-v`) or debug traces (`-vv`).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Path to a custom `tether.toml` configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Control colored output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per line on stdout.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

/// Log filter for the given flags; `-q` wins over `-v`.
fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(quiet, verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        color,
        config: cli.config.clone(),
    };

    match build::run(&cli, &global) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
