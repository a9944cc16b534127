//! Compiler diagnostics and the aggregated failure report.

use std::fmt;
use std::path::PathBuf;

/// Message emitted by the backend for the secondary location of a previous error.
pub const RELATED_SYMBOL_MARKER: &str = "(Location of the symbol related to previous error)";

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single issue reported by the compiler backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<PathBuf>, line: u32, column: u32, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn warning(file: impl Into<PathBuf>, line: u32, column: u32, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file, line, column, code, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Whether this entry only points at a symbol related to the previous error
    pub fn is_related_location(&self) -> bool {
        self.message.contains(RELATED_SYMBOL_MARKER)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {} {}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Render diagnostics as one multi-line report.
///
/// The first line carries the total diagnostic count; each diagnostic then
/// gets its own line, with related-symbol locations indented under the
/// entry they belong to.
pub fn format_report(diagnostics: &[Diagnostic]) -> String {
    let mut report = format!("Compilation failed; {} errors: ", diagnostics.len());

    for diagnostic in diagnostics {
        report.push('\n');
        if diagnostic.is_related_location() {
            report.push_str("    ");
            report.push_str(&diagnostic.message);
        } else {
            report.push_str(&diagnostic.to_string());
        }
    }

    report
}

/// A controlled compilation failure: the backend ran but produced no usable module.
#[derive(Debug, Clone)]
pub struct CompilationFailure {
    diagnostics: Vec<Diagnostic>,
    report: String,
}

impl CompilationFailure {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let report = format_report(&diagnostics);
        Self { diagnostics, report }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// The formatted multi-line report
    pub fn report(&self) -> &str {
        &self.report
    }
}

impl fmt::Display for CompilationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report)
    }
}

impl std::error::Error for CompilationFailure {}
