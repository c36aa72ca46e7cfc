//! Diagnostic codes emitted by the build driver.

use tether_diagnostics::{Category, DiagnosticCode};

/// An output file already exists and `force` was not given.
pub const OUTPUT_COLLISION: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
/// The requested probe depth differs from the one recorded in metadata.
pub const PROBE_DEPTH_DRIFT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);
/// The requested clock net differs from the one recorded in metadata.
pub const CLK_NET_DRIFT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);
/// The instrumented design has too few probe wires and is rebuilt.
pub const BUS_TOO_NARROW: DiagnosticCode = DiagnosticCode::new(Category::Note, 104);
