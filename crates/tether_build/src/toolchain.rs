//! The external vendor steps a build delegates to.
//!
//! Inserting and placing the debug core and the final route/bitstream run
//! are done by vendor tools. [`CommandToolchain`] runs the argv templates
//! configured under `[toolchain]` in `tether.toml`, substituting
//! `{input}`, `{output}`, `{probe_count}`, `{probe_depth}`, `{clk_net}`,
//! `{probes}` and `{ltx}`.

use std::path::Path;
use std::process::Command;

use tether_config::ToolchainConfig;

use crate::error::ToolchainError;

/// Inputs of the instrumentation step.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentRequest<'a> {
    /// Routed user design.
    pub input: &'a Path,
    /// Where to write the placed design with a debug core.
    pub output: &'a Path,
    /// Width of the debug core's probe bus.
    pub probe_count: u32,
    /// Sample depth.
    pub probe_depth: u32,
    /// Sample clock net.
    pub clk_net: &'a str,
}

/// Inputs of the finalization step.
#[derive(Debug, Clone, Copy)]
pub struct FinalizeRequest<'a> {
    /// Checkpoint with rewired probes, routed and rewritten in place.
    pub checkpoint: &'a Path,
    /// Probe mapping file.
    pub probes: &'a Path,
    /// Where to write the probe description file.
    pub ltx: &'a Path,
}

/// External tool invocations used by the build.
pub trait Toolchain {
    /// Inserts a debug core into `input`, places it, and writes `output`.
    fn instrument(&mut self, request: &InstrumentRequest<'_>) -> Result<(), ToolchainError>;

    /// Routes the rewired checkpoint and writes the probe description.
    fn finalize(&mut self, request: &FinalizeRequest<'_>) -> Result<(), ToolchainError>;
}

/// Runs configured commands.
#[derive(Debug, Clone, Default)]
pub struct CommandToolchain {
    instrument: Vec<String>,
    finalize: Vec<String>,
}

impl CommandToolchain {
    /// Creates a toolchain from the `[toolchain]` section.
    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self {
            instrument: config.instrument.clone(),
            finalize: config.finalize.clone(),
        }
    }
}

/// Replaces every `{key}` in `template` by its value.
fn substitute(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

fn run(stage: &'static str, template: &[String], values: &[(&str, String)]) -> Result<(), ToolchainError> {
    let argv: Vec<String> = template.iter().map(|arg| substitute(arg, values)).collect();
    let Some((program, args)) = argv.split_first() else {
        return Err(ToolchainError::NotConfigured { stage });
    };
    tracing::info!(stage, command = %argv.join(" "), "running external tool");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| ToolchainError::Spawn {
            stage,
            program: program.clone(),
            source: e,
        })?;
    if !status.success() {
        return Err(ToolchainError::Failed {
            stage,
            program: program.clone(),
            status: status.to_string(),
        });
    }
    Ok(())
}

impl Toolchain for CommandToolchain {
    fn instrument(&mut self, request: &InstrumentRequest<'_>) -> Result<(), ToolchainError> {
        let values = [
            ("input", request.input.display().to_string()),
            ("output", request.output.display().to_string()),
            ("probe_count", request.probe_count.to_string()),
            ("probe_depth", request.probe_depth.to_string()),
            ("clk_net", request.clk_net.to_string()),
        ];
        run("instrument", &self.instrument, &values)?;
        if !request.output.exists() {
            return Err(ToolchainError::MissingOutput {
                stage: "instrument",
                path: request.output.to_path_buf(),
            });
        }
        Ok(())
    }

    fn finalize(&mut self, request: &FinalizeRequest<'_>) -> Result<(), ToolchainError> {
        if self.finalize.is_empty() {
            tracing::warn!(
                checkpoint = %request.checkpoint.display(),
                "no finalize command configured, leaving the rewired checkpoint unrouted"
            );
            return Ok(());
        }
        let checkpoint = request.checkpoint.display().to_string();
        let values = [
            ("input", checkpoint.clone()),
            ("output", checkpoint),
            ("probes", request.probes.display().to_string()),
            ("ltx", request.ltx.display().to_string()),
        ];
        run("finalize", &self.finalize, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn substitutes_placeholders() {
        let values = [("input", "a.dcp".to_string()), ("probe_count", "8".to_string())];
        assert_eq!(substitute("--in={input}", &values), "--in=a.dcp");
        assert_eq!(substitute("{probe_count}x{probe_count}", &values), "8x8");
        assert_eq!(substitute("{unknown}", &values), "{unknown}");
    }

    #[test]
    fn unconfigured_instrument_is_an_error() {
        let mut tc = CommandToolchain::default();
        let err = tc
            .instrument(&InstrumentRequest {
                input: Path::new("a.dcp"),
                output: Path::new("b.dcp"),
                probe_count: 4,
                probe_depth: 1024,
                clk_net: "clk",
            })
            .unwrap_err();
        assert!(matches!(err, ToolchainError::NotConfigured { stage: "instrument" }));
    }

    #[test]
    fn unconfigured_finalize_is_skipped() {
        let mut tc = CommandToolchain::default();
        let request = FinalizeRequest {
            checkpoint: Path::new("out.dcp"),
            probes: Path::new("out_probes.txt"),
            ltx: Path::new("out.ltx"),
        };
        assert!(tc.finalize(&request).is_ok());
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let config = ToolchainConfig {
            instrument: Vec::new(),
            finalize: strings(&["/nonexistent/tether-test-tool", "{input}"]),
        };
        let mut tc = CommandToolchain::from_config(&config);
        let request = FinalizeRequest {
            checkpoint: Path::new("out.dcp"),
            probes: Path::new("out_probes.txt"),
            ltx: Path::new("out.ltx"),
        };
        assert!(matches!(tc.finalize(&request), Err(ToolchainError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn runs_configured_command() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("b.dcp");
        let config = ToolchainConfig {
            instrument: strings(&["sh", "-c", "printf '%s %s' {probe_count} {clk_net} > {output}"]),
            finalize: strings(&["false"]),
        };
        let mut tc = CommandToolchain::from_config(&config);
        tc.instrument(&InstrumentRequest {
            input: Path::new("a.dcp"),
            output: &output,
            probe_count: 16,
            probe_depth: 1024,
            clk_net: "sys_clk",
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "16 sys_clk");

        let request = FinalizeRequest {
            checkpoint: &output,
            probes: Path::new("p.txt"),
            ltx: Path::new("x.ltx"),
        };
        assert!(matches!(tc.finalize(&request), Err(ToolchainError::Failed { .. })));
    }
}
