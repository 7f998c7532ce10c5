use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::instruction::value::LiteralError;
use crate::parser::tokenizer::NestingError;

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("no statement form matches this line")]
    UnparseableLine,
    #[error("malformed nesting: {0}")]
    MalformedNesting(NestingError),
    #[error("malformed literal: {0}")]
    MalformedLiteral(LiteralError),
}

impl From<NestingError> for ParseErrorKind {
    fn from(error: NestingError) -> Self {
        ParseErrorKind::MalformedNesting(error)
    }
}

impl From<LiteralError> for ParseErrorKind {
    fn from(error: LiteralError) -> Self {
        match error {
            LiteralError::Nesting(nesting) => ParseErrorKind::MalformedNesting(nesting),
            other => ParseErrorKind::MalformedLiteral(other),
        }
    }
}

/// A failed parse, pinned to exactly one offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step {step}: {kind}: {line}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based step number the line would have received.
    pub step: usize,
    /// The offending line, verbatim.
    pub line: String,
    /// Byte span of the line in the source.
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ParseError {
    pub fn new(
        kind: impl Into<ParseErrorKind>,
        step: usize,
        line: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind: kind.into(),
            step,
            line: line.into(),
            span,
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut notes = vec![format!("while parsing step {}", self.step)];
        if self.kind == ParseErrorKind::UnparseableLine {
            notes.push(
                "expected one of: `name = expr`, `name = call(...)[n]`, `name = call(...)`, \
                 `call(...)`, `name = collection[n]`, `name = value`"
                    .to_string(),
            );
        }
        Diagnostic::error()
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(notes)
    }
}
