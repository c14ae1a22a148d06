//! Error taxonomy and diagnostic sink for the TouIST evaluation/CNF/emission
//! pipeline (spec §7).
//!
//! Every fallible operation in `touist-eval`, `touist-cnf` and `touist-emit`
//! returns [`Result<T>`], a thin alias over [`TouistError`]. Passes that want to
//! accumulate non-fatal warnings alongside a successful result push onto a
//! [`DiagnosticSink`] instead of returning early.

use std::fmt;

use colored::Colorize as _;
use touist_span::Span;

/// The four error kinds from spec §7, each carrying a source location when one
/// is available (a handful of internal-consistency checks have none).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TouistError {
    /// A variable reference could not be resolved in either environment.
    #[error("unbound name `{name}`")]
    NameError { name: String, span: Option<Span> },

    /// An operator's operand(s) have incompatible or unexpected flavors, or a
    /// formula-position variable holds a non-proposition (non-scalar in SMT
    /// mode).
    #[error("{message}")]
    TypeError { message: String, span: Option<Span> },

    /// `bigand`/`bigor` variable count differs from set count, or a generator
    /// over an empty set when the empty-generator policy is `Fatal`.
    #[error("{message}")]
    ArityError { message: String, span: Option<Span> },

    /// The AST was structurally invalid at a point where a specific node shape
    /// was expected. Should not occur with a well-formed parser.
    #[error("malformed AST: {message}")]
    ShapeError { message: String, span: Option<Span> },
}

impl TouistError {
    pub fn span(&self) -> Option<&Span> {
        match self {
            TouistError::NameError { span, .. }
            | TouistError::TypeError { span, .. }
            | TouistError::ArityError { span, .. }
            | TouistError::ShapeError { span, .. } => span.as_ref(),
        }
    }

    pub fn name(name: impl Into<String>, span: Span) -> Self {
        TouistError::NameError { name: name.into(), span: Some(span) }
    }

    pub fn ty(message: impl Into<String>, span: Span) -> Self {
        TouistError::TypeError { message: message.into(), span: Some(span) }
    }

    pub fn arity(message: impl Into<String>, span: Option<Span>) -> Self {
        TouistError::ArityError { message: message.into(), span }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        TouistError::ShapeError { message: message.into(), span: None }
    }
}

/// Result alias used throughout the core, mirroring the teacher's
/// `leo_errors::Result` convention of one error crate shared by every pass.
pub type Result<T> = std::result::Result<T, TouistError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "error"),
        }
    }
}

/// One entry in the append-only diagnostic sink (spec §5: "an append-only list
/// of `(severity, phase, message, location)` records").
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub phase: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(severity: Severity, phase: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic { severity, phase, message: message.into(), span }
    }

    pub fn from_error(phase: &'static str, err: &TouistError) -> Self {
        Diagnostic::new(Severity::Fatal, phase, err.to_string(), err.span().cloned())
    }

    /// `file:start_line:start_col-end_col: <severity>: <message>`, per spec §7.
    pub fn format_plain(&self) -> String {
        match &self.span {
            Some(span) => format!("{}: {}: {}", span.diagnostic_prefix(), self.severity, self.message),
            None => format!("<no location>: {}: {}", self.severity, self.message),
        }
    }

    pub fn format_colored(&self) -> String {
        let tag = match self.severity {
            Severity::Warning => "warning".yellow().bold(),
            Severity::Fatal => "error".red().bold(),
        };
        match &self.span {
            Some(span) => format!("{}: {}: {}", span.diagnostic_prefix(), tag, self.message),
            None => format!("<no location>: {}: {}", tag, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_plain())
    }
}

/// The append-only diagnostic list threaded through a single evaluation run.
///
/// `Fatal` severity does not unwind the stack by itself — callers that hit a
/// condition they consider fatal should both push the diagnostic and return a
/// `TouistError` from the current pass, per spec §7's propagation rule.
#[derive(Default, Debug, Clone)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::log!(
            match diagnostic.severity {
                Severity::Warning => log::Level::Warn,
                Severity::Fatal => log::Level::Error,
            },
            "[{}] {}",
            diagnostic.phase,
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn warn(&mut self, phase: &'static str, message: impl Into<String>, span: Option<Span>) {
        self.push(Diagnostic::new(Severity::Warning, phase, message, span));
    }

    pub fn fatal(&mut self, phase: &'static str, message: impl Into<String>, span: Option<Span>) {
        self.push(Diagnostic::new(Severity::Fatal, phase, message, span));
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Fatal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touist_span::{Pos, Span};

    fn span() -> Span {
        Span::new(Pos::new(1, 3, 2, "t.touist"), Pos::new(1, 4, 3, "t.touist"))
    }

    #[test]
    fn formats_per_spec_7() {
        let d = Diagnostic::new(Severity::Fatal, "eval", "incompatible types", Some(span()));
        assert_eq!(d.format_plain(), "t.touist:1:3-4: error: incompatible types");
    }

    #[test]
    fn sink_tracks_fatal() {
        let mut sink = DiagnosticSink::new();
        assert!(!sink.has_fatal());
        sink.warn("eval", "vacuous bigand", None);
        assert!(!sink.has_fatal());
        sink.fatal("eval", "nothing produced", None);
        assert!(sink.has_fatal());
        assert_eq!(sink.into_vec().len(), 2);
    }
}
