//! Source locations for the TouIST core.
//!
//! A [`Pos`] is the `(line, column, byte_offset, filename)` tuple the parser is
//! expected to produce for every token; a [`Span`] pairs a start and end `Pos`
//! and is what the AST's `Loc` wrapper carries (see `touist-ast`).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A single point in a source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
    pub byte_offset: u32,
    pub filename: Rc<str>,
}

impl Pos {
    pub fn new(line: u32, column: u32, byte_offset: u32, filename: impl Into<Rc<str>>) -> Self {
        Pos { line, column, byte_offset, filename: filename.into() }
    }

    /// A placeholder position for synthetic nodes (e.g. Tseytin auxiliaries)
    /// that were never written by a user.
    pub fn synthetic() -> Self {
        Pos { line: 0, column: 0, byte_offset: 0, filename: Rc::from("<generated>") }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A start/end pair of [`Pos`] values, produced by the parser and propagated by
/// the AST's `Loc` wrapper.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Span { start, end }
    }

    pub fn synthetic() -> Self {
        Span { start: Pos::synthetic(), end: Pos::synthetic() }
    }

    /// Formats as `file:start_line:start_col-end_col`, per the diagnostic format
    /// mandated by the error-handling design.
    pub fn diagnostic_prefix(&self) -> String {
        if self.start.line == self.end.line {
            format!(
                "{}:{}:{}-{}",
                self.start.filename, self.start.line, self.start.column, self.end.column
            )
        } else {
            format!(
                "{}:{}:{}-{}:{}",
                self.start.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic_prefix())
    }
}

/// Implemented by every AST node that carries (or can be asked for) a [`Span`].
///
/// Nodes that were never wrapped in `Ast::Loc` (e.g. values fabricated by the
/// evaluator itself) return a synthetic span.
pub trait Spanned {
    fn span(&self) -> Span;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_line_span_formats_without_repeating_line() {
        let span = Span::new(Pos::new(3, 1, 10, "a.touist"), Pos::new(3, 7, 16, "a.touist"));
        assert_eq!(span.diagnostic_prefix(), "a.touist:3:1-7");
    }

    #[test]
    fn multi_line_span_formats_with_both_lines() {
        let span = Span::new(Pos::new(3, 1, 10, "a.touist"), Pos::new(5, 2, 40, "a.touist"));
        assert_eq!(span.diagnostic_prefix(), "a.touist:3:1-5:2");
    }
}
