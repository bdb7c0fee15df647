//! Traceback-style diagnostics shared by the parser and the evaluator.

use crate::compiler::source::SourceIndex;
use crate::compiler::tokens::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator printed between a diagnostic and its cause.
pub const CAUSE_SEPARATOR: &str =
    "\nThe above exception was the direct cause of the following exception:\n\n";

/// Exception class names reported in tracebacks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum ErrorKind {
    SyntaxError,
    IndentationError,
    NameError,
    TypeError,
    ValueError,
    RuntimeError,
}

impl ErrorKind {
    /// Kinds raised before any code runs.
    pub fn is_parse_time(self) -> bool {
        matches!(self, ErrorKind::SyntaxError | ErrorKind::IndentationError)
    }
}

/// Whether a diagnostic was raised while parsing or while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Parse,
    Runtime,
}

/// A frozen, renderable error value.
///
/// All fields are private; the traceback text is produced once when the
/// value is built. Attaching a cause consumes the diagnostic and returns a
/// new one.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{rendered}")]
pub struct Diagnostic {
    kind: ErrorKind,
    message: String,
    span: Span,
    phase: Phase,
    scope: String,
    file: String,
    source_line: String,
    caret_col: usize,
    #[source]
    cause: Option<Box<Diagnostic>>,
    rendered: String,
}

impl Diagnostic {
    /// Error found while tokenizing or parsing. Rendered without a
    /// `Traceback` header.
    pub fn parse_error(kind: ErrorKind, message: impl Into<String>, span: Span, source: &SourceIndex) -> Self {
        Self::build(kind, message.into(), span, Phase::Parse, String::new(), source)
    }

    /// Error raised by running code inside `scope` (e.g. `<module>`).
    pub fn runtime_error(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
        scope: impl Into<String>,
        source: &SourceIndex,
    ) -> Self {
        Self::build(kind, message.into(), span, Phase::Runtime, scope.into(), source)
    }

    fn build(kind: ErrorKind, message: String, span: Span, phase: Phase, scope: String, source: &SourceIndex) -> Self {
        let line = span.start_line;
        let source_line = source.line_text(line).unwrap_or_default().to_string();
        let caret_col = span.start_col.saturating_sub(source.leading_trimmed(line));
        let mut diag = Self {
            kind,
            message,
            span,
            phase,
            scope,
            file: source.name().to_string(),
            source_line,
            caret_col,
            cause: None,
            rendered: String::new(),
        };
        diag.rendered = diag.render_frame();
        diag
    }

    /// Record `cause` as the direct cause of this diagnostic.
    pub fn with_cause(mut self, cause: Diagnostic) -> Self {
        self.rendered = format!("{}{}{}", self.render_frame(), CAUSE_SEPARATOR, cause.rendered);
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn cause(&self) -> Option<&Diagnostic> {
        self.cause.as_deref()
    }

    /// Iterate this diagnostic and its causes, most recent first.
    pub fn chain(&self) -> impl Iterator<Item = &Diagnostic> {
        std::iter::successors(Some(self), |d| d.cause())
    }

    /// Full traceback text including every cause.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// `Kind: message` without location.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }

    fn render_frame(&self) -> String {
        let mut out = String::new();
        match self.phase {
            Phase::Runtime => {
                out.push_str("Traceback (most recent call last):\n");
                out.push_str(&format!(
                    "  File \"{}\", line {}, in {}\n",
                    self.file, self.span.start_line, self.scope
                ));
            }
            Phase::Parse => {
                out.push_str(&format!("  File \"{}\", line {}\n", self.file, self.span.start_line));
            }
        }
        if !self.source_line.is_empty() {
            out.push_str(&format!("    {}\n", self.source_line));
            if self.kind == ErrorKind::SyntaxError {
                out.push_str(&format!("    {}^\n", " ".repeat(self.caret_col)));
            }
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }
}
