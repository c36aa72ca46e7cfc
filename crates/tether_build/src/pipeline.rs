//! The build driver.
//!
//! 1. Derive the artifact layout and refuse to overwrite outputs.
//! 2. Reconcile parameters with metadata and pick the resume point.
//! 3. Load the resume checkpoint and build the probe map.
//! 4. Insert the debug core if the resume point requires it.
//! 5. Rewire the probes and route the exposed pins in one batch.
//! 6. Write the output checkpoint and probe file, then finalize.
//!
//! Each stage reads its input from disk, so a failed run can be resumed
//! from whatever the last successful stage wrote.

use std::path::{Path, PathBuf};

use tether_config::TetherConfig;
use tether_diagnostics::DiagnosticSink;
use tether_netlist::{load_checkpoint, save_checkpoint, Design, GlobalRouter};
use tether_probe::{
    apply_requested_count, find_default_net, from_debug_nets, from_requests, read_probe_requests, reroute,
    write_probe_file, ProbeBus, ProbeMap,
};

use crate::error::BuildError;
use crate::layout::{ArtifactLayout, ArtifactState};
use crate::metadata::{read_metadata, write_metadata};
use crate::resolver::{check_capacity, reconcile, resolve, ParamOverrides, ResumePoint};
use crate::toolchain::{FinalizeRequest, InstrumentRequest, Toolchain};

/// Everything a build is asked to do.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Routed user design without a debug core.
    pub input: PathBuf,
    /// Output checkpoint; defaults to `<stem>_probes.dcp`.
    pub output: Option<PathBuf>,
    /// Probe request file; without one, debug-flagged nets are probed.
    pub input_probes: Option<PathBuf>,
    /// Output probe file; defaults to a sibling of the output.
    pub output_probes: Option<PathBuf>,
    /// Work directory; defaults to the configured one.
    pub work_dir: Option<PathBuf>,
    /// Requested probe count.
    pub probe_count: Option<u32>,
    /// Requested probe depth and clock net.
    pub overrides: ParamOverrides,
    /// Discard the instrumented checkpoint.
    pub refresh: bool,
    /// Overwrite existing outputs.
    pub force: bool,
    /// Directory relative paths are resolved against.
    pub cwd: PathBuf,
}

/// What a finished build did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The stage the build resumed from, after any capacity downgrade.
    pub resumed_from: ResumePoint,
    /// Whether the debug core was inserted in this run.
    pub instrumented: bool,
    /// Width of the probe bus in the output.
    pub probe_count: u32,
    /// Probes rewired to their targets.
    pub rewired: usize,
    /// Probes left untouched.
    pub skipped: usize,
    /// Site pins routed by the global router.
    pub routed: usize,
    /// The artifacts of this build.
    pub layout: ArtifactLayout,
}

/// Builds the probe map for `design` from the request file or debug nets.
fn load_probes(
    design: &Design,
    bus: &ProbeBus,
    options: &BuildOptions,
    checkpoint: &Path,
    sink: &DiagnosticSink,
) -> Result<(ProbeMap, Option<String>), BuildError> {
    match &options.input_probes {
        Some(path) => {
            let path = options.cwd.join(path);
            let requests = read_probe_requests(&path)?;
            let default = find_default_net(
                &design.logical,
                requests.iter().filter_map(|r| r.target.as_deref()),
                sink,
            );
            let map = from_requests(bus, &requests, default.as_deref(), &path.display().to_string(), sink)?;
            Ok((map, default))
        }
        None => {
            let nets = design.logical.nets_marked_for_debug();
            let default = find_default_net(&design.logical, nets.iter().map(String::as_str), sink);
            let map = from_debug_nets(bus, &nets, &checkpoint.display().to_string(), sink)?;
            Ok((map, default))
        }
    }
}

/// Runs a complete build.
pub fn run_build(
    options: &BuildOptions,
    config: &TetherConfig,
    toolchain: &mut dyn Toolchain,
    router: &mut dyn GlobalRouter,
    sink: &DiagnosticSink,
) -> Result<BuildReport, BuildError> {
    let work_dir = options
        .work_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.paths.work_dir));
    let layout = ArtifactLayout::new(
        &options.input,
        options.output.as_deref(),
        options.output_probes.as_deref(),
        &work_dir,
        &options.cwd,
    );
    layout.check_collisions(options.force, sink)?;

    let meta = read_metadata(&layout.metadata);
    let params = reconcile(&options.overrides, &meta, &config.defaults, sink);
    let state = ArtifactState::stat(&layout);
    let mut point = resolve(&layout, &state, options.refresh, params.drift)?;

    let mut design = load_checkpoint(point.checkpoint())?;
    let bus = ProbeBus::from_config(&config.probe);
    let (mut probes, default) = load_probes(&design, &bus, options, point.checkpoint(), sink)?;
    let mut probe_count = apply_requested_count(&mut probes, options.probe_count, default.as_deref(), sink)?;

    if !point.needs_instrumentation() {
        let width = design.logical.port_width(bus.core(), bus.port()).unwrap_or(0);
        point = check_capacity(point, width, probe_count, &layout, &state, sink)?;
        if !point.needs_instrumentation() {
            probes.pad_to(width, default.as_deref());
            probe_count = width;
        }
    }
    tracing::info!(probe_count, "probe map ready");

    let instrumented = point.needs_instrumentation();
    if instrumented {
        std::fs::create_dir_all(&layout.work_dir).map_err(|e| BuildError::Io {
            path: layout.work_dir.clone(),
            source: e,
        })?;
        toolchain.instrument(&InstrumentRequest {
            input: &layout.input,
            output: &layout.instrumented,
            probe_count,
            probe_depth: params.probe_depth,
            clk_net: &params.clk_net,
        })?;
        // Metadata always describes the instrumented checkpoint on disk.
        write_metadata(&layout.metadata, &params.metadata())?;
        design = load_checkpoint(&layout.instrumented)?;
    }

    let outcome = reroute(&mut design, &probes, sink)?;
    let summary = router.route_pins(&mut design.physical, &outcome.pins_to_route)?;
    tracing::info!(routed = summary.routed, "global routing done");

    save_checkpoint(&design, &layout.output)?;
    write_probe_file(&layout.output_probes, &probes, probe_count)?;
    toolchain.finalize(&FinalizeRequest {
        checkpoint: &layout.output,
        probes: &layout.output_probes,
        ltx: &layout.output_ltx,
    })?;

    Ok(BuildReport {
        resumed_from: point,
        instrumented,
        probe_count,
        rewired: outcome.rewired.len(),
        skipped: outcome.skipped.len(),
        routed: summary.routed,
        layout,
    })
}
