//! Error types for the build driver.

use std::path::PathBuf;

use tether_netlist::{CheckpointError, RouterError};
use tether_probe::{ProbeFileError, ProbeMapError, RerouteError};
use thiserror::Error;

/// Fatal errors that end a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An I/O error occurred.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Neither the input nor the instrumented checkpoint exists.
    #[error("couldn't find any valid starting checkpoint: neither {input} nor {instrumented} exists")]
    NoStartingCheckpoint {
        /// The input checkpoint.
        input: PathBuf,
        /// The instrumented checkpoint.
        instrumented: PathBuf,
    },

    /// The instrumented checkpoint cannot be reused and there is nothing to rebuild it from.
    #[error("{reason}, but can't find input checkpoint {input}")]
    NoInputToRebuild {
        /// Why the instrumented checkpoint cannot be reused.
        reason: String,
        /// The missing input checkpoint.
        input: PathBuf,
    },

    /// One or more outputs already exist.
    #[error("{count} output file(s) would be overwritten. Use force (-f) to overwrite.")]
    OutputCollision {
        /// Number of colliding files.
        count: usize,
    },

    /// A checkpoint could not be read or written.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// A probe file could not be read or written.
    #[error(transparent)]
    ProbeFile(#[from] ProbeFileError),

    /// No usable probe map could be built.
    #[error(transparent)]
    ProbeMap(#[from] ProbeMapError),

    /// Probe rewiring failed.
    #[error(transparent)]
    Reroute(#[from] RerouteError),

    /// Global routing failed.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// An external tool failed.
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

/// Errors from external toolchain invocations.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No command is configured for a required stage.
    #[error("no `{stage}` command configured in [toolchain]")]
    NotConfigured {
        /// The stage name.
        stage: &'static str,
    },

    /// The command could not be started.
    #[error("failed to run `{program}` for {stage}: {source}")]
    Spawn {
        /// The stage name.
        stage: &'static str,
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The command exited unsuccessfully.
    #[error("{stage} command `{program}` failed with {status}")]
    Failed {
        /// The stage name.
        stage: &'static str,
        /// The program.
        program: String,
        /// Exit status description.
        status: String,
    },

    /// A tool ran but did not produce its expected output.
    #[error("{stage} did not produce {path}")]
    MissingOutput {
        /// The stage name.
        stage: &'static str,
        /// The expected output file.
        path: PathBuf,
    },
}
