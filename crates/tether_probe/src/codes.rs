//! Diagnostic codes emitted while building probe maps and rewiring probes.

use tether_diagnostics::{Category, DiagnosticCode};

/// A probe whose sink count is not exactly one was skipped.
pub const SINK_COUNT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
/// A probe's target net does not exist in the netlist.
pub const TARGET_NOT_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
/// A probe's target net has no physical implementation.
pub const NO_PHYSICAL_NET: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);
/// A probe's sink cell is not placed or its pin has no BEL mapping.
pub const SINK_NOT_PLACED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 204);
/// A probe has no target and no default net to fall back to.
pub const NO_TARGET: DiagnosticCode = DiagnosticCode::new(Category::Warning, 205);
/// More nets are flagged for debug than the probe bus can ever hold.
pub const DEBUG_LIST_TRUNCATED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 206);
/// Floating requests were left over after every probe index was used.
pub const FLOATING_DROPPED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 207);
/// A probe's sink shares its row site pin with a BEL on another net.
pub const ROW_PIN_CONFLICT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 208);

/// No default net could be found.
pub const NO_DEFAULT_NET: DiagnosticCode = DiagnosticCode::new(Category::Note, 101);
/// A request with a non-matching probe name was assigned a free index.
pub const FLOATING_ASSIGNED: DiagnosticCode = DiagnosticCode::new(Category::Note, 102);
/// The requested probe count was ignored.
pub const COUNT_IGNORED: DiagnosticCode = DiagnosticCode::new(Category::Note, 103);
