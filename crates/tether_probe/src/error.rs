//! Error types for probe files, probe maps and rerouting.

use std::path::PathBuf;

use tether_common::InternalError;
use tether_netlist::NetlistError;
use thiserror::Error;

/// Errors raised while reading or writing probe files.
#[derive(Debug, Error)]
pub enum ProbeFileError {
    /// An I/O error occurred.
    #[error("failed to access probe file {path}: {source}")]
    Io {
        /// The probe file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A non-comment line did not hold exactly two tokens.
    #[error("malformed probe line {line}: `{content}`")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },
}

/// Fatal problems building a probe map.
#[derive(Debug, Error)]
pub enum ProbeMapError {
    /// No probe could be mapped.
    #[error("no probes to map from {source_name}")]
    Empty {
        /// Where the probes were read from.
        source_name: String,
    },

    /// A request named a probe index beyond the hard limit.
    #[error("probe {probe} is out of range, the maximum probe count is {max}")]
    IndexOutOfRange {
        /// The offending probe name.
        probe: String,
        /// The hard limit.
        max: u32,
    },

    /// The requested probe count exceeds the hard limit.
    #[error("requested probe count {requested} exceeds the maximum of {max}")]
    CountOverLimit {
        /// The requested count.
        requested: u32,
        /// The hard limit.
        max: u32,
    },
}

/// Fatal errors during probe rerouting.
#[derive(Debug, Error)]
pub enum RerouteError {
    /// A probe's debug core instance does not exist.
    #[error("cannot find instance {0} for probe rewiring")]
    UnknownInstance(String),

    /// The debug core has no such probe pin.
    #[error("cannot find pin {pin} on instance {inst}")]
    UnknownPin {
        /// Instance path.
        inst: String,
        /// Pin name.
        pin: String,
    },

    /// A netlist edit failed.
    #[error(transparent)]
    Netlist(#[from] NetlistError),

    /// An internal invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
