//! The `tether` build command.
//!
//! Loads configuration, runs the build through the configured toolchain,
//! and renders diagnostics and a summary.

use tether_build::{run_build, BuildOptions, BuildReport, CommandToolchain, ParamOverrides};
use tether_config::TetherConfig;
use tether_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity, TerminalRenderer};
use tether_netlist::DirectRouter;

use crate::{Cli, GlobalArgs, ReportFormat};

/// Runs a build for the parsed command line.
///
/// Returns exit code 0 on success. Fatal errors are returned to `main`.
pub fn run(cli: &Cli, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config: TetherConfig = match &global.config {
        Some(path) => tether_config::load_config_file(path)?,
        None => tether_config::load_config(&cwd)?,
    };
    tracing::debug!(
        core = %config.probe.core,
        port = %config.probe.port,
        work_dir = %config.paths.work_dir,
        "configuration loaded"
    );

    let options = BuildOptions {
        input: cli.input_dcp.clone(),
        output: cli.output_dcp.clone(),
        input_probes: cli.input_probes.clone(),
        output_probes: cli.output_probes.clone(),
        work_dir: cli.work_dir.clone(),
        probe_count: cli.probe_count,
        overrides: ParamOverrides {
            probe_depth: cli.probe_depth,
            clk_net: cli.clk_net.clone(),
        },
        refresh: cli.refresh,
        force: cli.force,
        cwd,
    };

    if !global.quiet && cli.format == ReportFormat::Text {
        eprintln!("   Rewiring {}", options.input.display());
    }

    let sink = DiagnosticSink::new();
    let mut toolchain = CommandToolchain::from_config(&config.toolchain);
    let result = run_build(&options, &config, &mut toolchain, &mut DirectRouter, &sink);
    render_diagnostics(&sink.take_all(), cli.format, global);
    let report = result?;

    match cli.format {
        ReportFormat::Text => {
            if !global.quiet {
                print_summary(&report);
            }
        }
        ReportFormat::Json => println!("{}", report_json(&report)),
    }
    Ok(0)
}

fn render_diagnostics(diagnostics: &[Diagnostic], format: ReportFormat, global: &GlobalArgs) {
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics {
                if global.quiet && diag.severity != Severity::Error {
                    continue;
                }
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => print!("{}", JsonRenderer.render_all(diagnostics)),
    }
}

fn print_summary(report: &BuildReport) {
    eprintln!(
        "    Resumed from {} ({})",
        report.resumed_from,
        report.resumed_from.checkpoint().display()
    );
    if report.instrumented {
        eprintln!("   Inserted debug core with {} probe wires", report.probe_count);
    }
    eprintln!(
        "    Rewired {} probe(s), {} skipped, {} pin(s) routed",
        report.rewired, report.skipped, report.routed
    );
    eprintln!("      Wrote {}", report.layout.output.display());
    eprintln!("      Wrote {}", report.layout.output_probes.display());
}

fn report_json(report: &BuildReport) -> serde_json::Value {
    serde_json::json!({
        "resumed_from": report.resumed_from.to_string(),
        "resumed_checkpoint": report.resumed_from.checkpoint().display().to_string(),
        "instrumented": report.instrumented,
        "probe_count": report.probe_count,
        "rewired": report.rewired,
        "skipped": report.skipped,
        "routed": report.routed,
        "output": report.layout.output.display().to_string(),
        "output_probes": report.layout.output_probes.display().to_string(),
        "output_ltx": report.layout.output_ltx.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tether_build::{ArtifactLayout, ResumePoint};

    fn report() -> BuildReport {
        let cwd = Path::new("/work");
        BuildReport {
            resumed_from: ResumePoint::InstrumentedUnwired {
                checkpoint: PathBuf::from("/work/.iii/design_1_ila.dcp"),
            },
            instrumented: false,
            probe_count: 4,
            rewired: 3,
            skipped: 1,
            routed: 3,
            layout: ArtifactLayout::new(
                Path::new("design_1_wrapper_routed.dcp"),
                None,
                None,
                Path::new(".iii"),
                cwd,
            ),
        }
    }

    #[test]
    fn json_summary_fields() {
        let value = report_json(&report());
        assert_eq!(value["probe_count"], 4);
        assert_eq!(value["rewired"], 3);
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["instrumented"], false);
        assert_eq!(value["output"], "/work/design_1_probes.dcp");
        assert_eq!(value["output_probes"], "/work/design_1_probes_probes.txt");
        assert_eq!(value["resumed_from"], "instrumented, unwired");
        assert_eq!(value["resumed_checkpoint"], "/work/.iii/design_1_ila.dcp");
    }
}
