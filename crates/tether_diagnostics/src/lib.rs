//! Diagnostic creation, severity management, and rendering.
//!
//! Recoverable problems found while rewiring probes or reconciling build
//! parameters are reported as structured [`Diagnostic`] values rather than
//! errors. The [`DiagnosticSink`] accumulates them during a run and a
//! [`DiagnosticRenderer`] formats them for the terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
