//! Choosing the checkpoint a build resumes from.
//!
//! | input | instrumented | refresh or drift | resume point |
//! |-------|--------------|------------------|--------------|
//! | no    | no           | any              | error |
//! | no    | yes          | no               | instrumented |
//! | no    | yes          | yes              | error |
//! | yes   | no           | any              | no instrumentation |
//! | yes   | yes          | yes              | no instrumentation |
//! | yes   | yes          | no               | instrumented, unless the input is newer |

use std::fmt;
use std::path::{Path, PathBuf};

use tether_config::DefaultsConfig;
use tether_diagnostics::{Diagnostic, DiagnosticSink};

use crate::codes;
use crate::error::BuildError;
use crate::layout::{ArtifactLayout, ArtifactState};
use crate::metadata::BuildMetadata;

/// The stage a build resumes from, with the checkpoint to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumePoint {
    /// Start from the user design; the debug core must be inserted.
    NoInstrumentation {
        /// The input checkpoint.
        checkpoint: PathBuf,
    },
    /// Start from a design with a debug core whose probes are not rewired.
    InstrumentedUnwired {
        /// The instrumented checkpoint.
        checkpoint: PathBuf,
    },
}

impl ResumePoint {
    /// The checkpoint to load.
    pub fn checkpoint(&self) -> &Path {
        match self {
            ResumePoint::NoInstrumentation { checkpoint } | ResumePoint::InstrumentedUnwired { checkpoint } => {
                checkpoint
            }
        }
    }

    /// Returns `true` if the debug core still has to be inserted.
    pub fn needs_instrumentation(&self) -> bool {
        matches!(self, ResumePoint::NoInstrumentation { .. })
    }
}

impl fmt::Display for ResumePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumePoint::NoInstrumentation { .. } => f.write_str("no instrumentation"),
            ResumePoint::InstrumentedUnwired { .. } => f.write_str("instrumented, unwired"),
        }
    }
}

/// Parameter values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    /// Requested probe depth.
    pub probe_depth: Option<u32>,
    /// Requested sample clock net.
    pub clk_net: Option<String>,
}

/// Effective debug core parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    /// Sample depth.
    pub probe_depth: u32,
    /// Sample clock net.
    pub clk_net: String,
    /// A requested value contradicts the recorded metadata.
    pub drift: bool,
}

impl BuildParams {
    /// The metadata recording these parameters.
    pub fn metadata(&self) -> BuildMetadata {
        BuildMetadata {
            probe_depth: Some(self.probe_depth),
            clk_net: Some(self.clk_net.clone()),
        }
    }
}

/// Picks one parameter from the override, the metadata, or the default.
fn pick<T: Clone + PartialEq>(requested: Option<&T>, recorded: Option<&T>, default: &T) -> (T, bool) {
    match (requested, recorded) {
        (Some(req), Some(rec)) => (req.clone(), req != rec),
        (Some(req), None) => (req.clone(), false),
        (None, Some(rec)) => (rec.clone(), false),
        (None, None) => (default.clone(), false),
    }
}

/// Reconciles requested parameters with recorded metadata.
///
/// Each parameter comes from the override, else the metadata, else the
/// configured default. An override that contradicts a recorded value is
/// drift and is reported as a warning.
pub fn reconcile(
    overrides: &ParamOverrides,
    meta: &BuildMetadata,
    defaults: &DefaultsConfig,
    sink: &DiagnosticSink,
) -> BuildParams {
    let (probe_depth, depth_drift) = pick(
        overrides.probe_depth.as_ref(),
        meta.probe_depth.as_ref(),
        &defaults.probe_depth,
    );
    if depth_drift {
        sink.emit(
            Diagnostic::warning(
                codes::PROBE_DEPTH_DRIFT,
                format!(
                    "probe depth {probe_depth} differs from {} recorded for the instrumented design",
                    meta.probe_depth.unwrap_or_default()
                ),
            )
            .with_note("the debug core will be inserted again"),
        );
    }

    let (clk_net, clk_drift) = pick(overrides.clk_net.as_ref(), meta.clk_net.as_ref(), &defaults.clk_net);
    if clk_drift {
        sink.emit(
            Diagnostic::warning(
                codes::CLK_NET_DRIFT,
                format!(
                    "clock net {clk_net} differs from {} recorded for the instrumented design",
                    meta.clk_net.as_deref().unwrap_or_default()
                ),
            )
            .with_note("the debug core will be inserted again"),
        );
    }

    tracing::info!(probe_depth, clk_net = %clk_net, "build parameters");
    BuildParams {
        probe_depth,
        clk_net,
        drift: depth_drift || clk_drift,
    }
}

/// Chooses the resume point from the artifacts on disk.
pub fn resolve(
    layout: &ArtifactLayout,
    state: &ArtifactState,
    refresh: bool,
    drift: bool,
) -> Result<ResumePoint, BuildError> {
    let from_input = || ResumePoint::NoInstrumentation {
        checkpoint: layout.input.clone(),
    };
    let from_instrumented = || ResumePoint::InstrumentedUnwired {
        checkpoint: layout.instrumented.clone(),
    };

    let point = match (state.input, state.instrumented) {
        (None, None) => {
            return Err(BuildError::NoStartingCheckpoint {
                input: layout.input.clone(),
                instrumented: layout.instrumented.clone(),
            })
        }
        (None, Some(_)) if refresh => {
            return Err(BuildError::NoInputToRebuild {
                reason: "refresh requested".to_string(),
                input: layout.input.clone(),
            })
        }
        (None, Some(_)) if drift => {
            return Err(BuildError::NoInputToRebuild {
                reason: "requested parameters differ from metadata".to_string(),
                input: layout.input.clone(),
            })
        }
        (None, Some(_)) => from_instrumented(),
        (Some(_), None) => from_input(),
        (Some(input), Some(instrumented)) => {
            if refresh || drift || input > instrumented {
                from_input()
            } else {
                from_instrumented()
            }
        }
    };
    tracing::info!(resume = %point, checkpoint = %point.checkpoint().display(), "resolved resume point");
    Ok(point)
}

/// Makes sure an instrumented design has enough probe wires.
///
/// `bus_width` is the width of the debug core's probe port, 0 when the port
/// is missing. A bus narrower than `probe_count` sends the build back to
/// the input checkpoint.
pub fn check_capacity(
    point: ResumePoint,
    bus_width: u32,
    probe_count: u32,
    layout: &ArtifactLayout,
    state: &ArtifactState,
    sink: &DiagnosticSink,
) -> Result<ResumePoint, BuildError> {
    if point.needs_instrumentation() || bus_width >= probe_count {
        return Ok(point);
    }
    if state.input.is_none() {
        return Err(BuildError::NoInputToRebuild {
            reason: format!("the instrumented design has {bus_width} probe wires but {probe_count} are needed"),
            input: layout.input.clone(),
        });
    }
    sink.emit(
        Diagnostic::note(
            codes::BUS_TOO_NARROW,
            format!("the instrumented design has {bus_width} probe wires but {probe_count} are needed"),
        )
        .with_subject(point.checkpoint().display().to_string())
        .with_note("a debug core with more probe wires will be inserted"),
    );
    Ok(ResumePoint::NoInstrumentation {
        checkpoint: layout.input.clone(),
    })
}
