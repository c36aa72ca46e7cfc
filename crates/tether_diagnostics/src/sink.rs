//! Diagnostic accumulator for one build.

use std::cell::{Cell, RefCell};

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Collects diagnostics in emission order.
///
/// Emission only needs `&self`, so the sink is passed down through the build
/// by shared reference. A build runs on one thread, so the sink is not `Sync`.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
    errors: Cell<usize>,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.set(self.errors.get() + 1);
        }
        self.diagnostics.borrow_mut().push(diag);
    }

    /// Returns `true` if any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }

    /// Number of errors emitted so far, including drained ones.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// Number of held diagnostics at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.borrow().iter().filter(|d| d.severity == severity).count()
    }

    /// Returns `true` if a held diagnostic carries `code`.
    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.code == code)
    }

    /// Takes all held diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Copies the held diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    const COLLISION: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    const SINK_COUNT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);

    fn collision() -> Diagnostic {
        Diagnostic::error(COLLISION, "design_1_probes.dcp already exists")
    }

    fn multi_sink() -> Diagnostic {
        Diagnostic::warning(SINK_COUNT, "found 2 on top/u_ila_0/probe0[3]")
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn errors_are_counted() {
        let sink = DiagnosticSink::new();
        sink.emit(collision());
        sink.emit(multi_sink());
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.count(Severity::Warning), 1);
        assert!(sink.has_code(SINK_COUNT));
        assert!(!sink.has_code(DiagnosticCode::new(Category::Note, 101)));
    }

    #[test]
    fn take_all_drains_in_order() {
        let sink = DiagnosticSink::new();
        sink.emit(multi_sink());
        sink.emit(collision());
        let codes: Vec<_> = sink.take_all().into_iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![SINK_COUNT, COLLISION]);
        assert!(sink.diagnostics().is_empty());
        assert_eq!(sink.error_count(), 1);
    }
}
