//! Artifact paths of a build and their on-disk state.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tether_diagnostics::{Diagnostic, DiagnosticSink};
use tether_netlist::modified_time;

use crate::codes;
use crate::error::BuildError;
use crate::metadata::METADATA_FILE_NAME;

/// Marker that starts the vendor-generated suffix of a design file name.
const WRAPPER_MARKER: &str = "_wrapper_";

/// Every file a build reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Routed user design without a debug core.
    pub input: PathBuf,
    /// Directory for intermediate artifacts.
    pub work_dir: PathBuf,
    /// Placed design with a debug core whose probes are not yet rewired.
    pub instrumented: PathBuf,
    /// Final checkpoint with rewired probes.
    pub output: PathBuf,
    /// Probe mapping written next to the output.
    pub output_probes: PathBuf,
    /// Probe description file written by finalization.
    pub output_ltx: PathBuf,
    /// Build metadata inside the work directory.
    pub metadata: PathBuf,
}

/// Design stem of a checkpoint file name.
///
/// `design_1_wrapper_routed.dcp` has the stem `design_1`; names without the
/// wrapper marker lose only their extension.
pub fn design_stem(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.find(WRAPPER_MARKER) {
        Some(pos) => name[..pos].to_string(),
        None => Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ArtifactLayout {
    /// Derives the layout. Relative paths are taken relative to `cwd`.
    ///
    /// Without an explicit output, the output is `<stem>_probes.dcp` in
    /// `cwd`. The probes and ltx files default to siblings of the output.
    pub fn new(
        input: &Path,
        output: Option<&Path>,
        output_probes: Option<&Path>,
        work_dir: &Path,
        cwd: &Path,
    ) -> Self {
        let stem = design_stem(input);
        let work_dir = cwd.join(work_dir);
        let output = match output {
            Some(path) => cwd.join(path),
            None => cwd.join(format!("{stem}_probes.dcp")),
        };
        let out_dir = output.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
        let out_stem = file_stem(&output);
        let output_probes = match output_probes {
            Some(path) => cwd.join(path),
            None => out_dir.join(format!("{out_stem}_probes.txt")),
        };
        Self {
            input: cwd.join(input),
            instrumented: work_dir.join(format!("{stem}_ila.dcp")),
            metadata: work_dir.join(METADATA_FILE_NAME),
            output_ltx: out_dir.join(format!("{out_stem}.ltx")),
            output,
            output_probes,
            work_dir,
        }
    }

    /// Outputs a build may not overwrite without `force`.
    pub fn protected_outputs(&self) -> [(&'static str, &Path); 3] {
        [
            ("checkpoint", &self.output),
            ("probes file", &self.output_probes),
            ("ltx", &self.output_ltx),
        ]
    }

    /// Reports every protected output that already exists.
    ///
    /// Each collision is emitted as an error diagnostic before the single
    /// returned error. With `force` nothing is checked.
    pub fn check_collisions(&self, force: bool, sink: &DiagnosticSink) -> Result<(), BuildError> {
        if force {
            return Ok(());
        }
        let mut count = 0;
        for (kind, path) in self.protected_outputs() {
            if path.exists() {
                sink.emit(
                    Diagnostic::error(codes::OUTPUT_COLLISION, format!("the output {kind} would overwrite another file"))
                        .with_subject(path.display().to_string()),
                );
                count += 1;
            }
        }
        if count > 0 {
            return Err(BuildError::OutputCollision { count });
        }
        Ok(())
    }
}

/// Modification times of the two resumable checkpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactState {
    /// The input checkpoint, if it exists.
    pub input: Option<SystemTime>,
    /// The instrumented checkpoint, if it exists.
    pub instrumented: Option<SystemTime>,
}

impl ArtifactState {
    /// Reads the current state from disk.
    pub fn stat(layout: &ArtifactLayout) -> Self {
        Self {
            input: modified_time(&layout.input),
            instrumented: modified_time(&layout.instrumented),
        }
    }
}
