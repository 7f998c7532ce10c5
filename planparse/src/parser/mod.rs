pub mod error;
pub mod preprocess;
pub mod recognizer;
pub mod tokenizer;

pub use error::{ParseError, ParseErrorKind};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::Plan;
use crate::instruction::{Instruction, builder};
use crate::parser::preprocess::SourceLine;

/// Knobs for a parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Skip dict entries that lack a `:` instead of failing the line.
    pub lenient_dicts: bool,
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    options: ParseOptions,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Self::with_options(source, file_id, ParseOptions::default())
    }

    pub fn with_options(source: String, file_id: usize, options: ParseOptions) -> Self {
        Parser {
            source,
            file_id,
            options,
        }
    }

    /// Parse the whole block. Either every line becomes an instruction or the
    /// first failing line is reported; no partial result is returned.
    pub fn parse(&self) -> Result<Plan, ParseError> {
        let instructions = self.steps().collect::<Result<Vec<_>, _>>()?;
        info!(count = instructions.len(), "parsed plan");
        Ok(Plan { instructions })
    }

    /// Lazily parse line by line.
    pub fn steps(&self) -> Steps<'_> {
        Steps {
            lines: preprocess::preprocess(&self.source).into_iter(),
            step: 0,
            state: DriverState::Scanning,
            options: &self.options,
            file_id: self.file_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Scanning,
    Done,
}

/// Line driver: yields one instruction per statement line, in order.
///
/// After the first error, or once the lines run out, the iterator stays
/// exhausted.
pub struct Steps<'a> {
    lines: std::vec::IntoIter<SourceLine<'a>>,
    step: usize,
    state: DriverState,
    options: &'a ParseOptions,
    file_id: usize,
}

impl Steps<'_> {
    fn parse_line(&self, line: &SourceLine<'_>) -> Result<Instruction, ParseErrorKind> {
        tokenizer::check_nesting(line.text)?;
        let Some((recognizer, statement)) = recognizer::recognize(line.text, self.options)? else {
            return Err(ParseErrorKind::UnparseableLine);
        };
        debug!(step = self.step, recognizer, line = line.text, "line claimed");
        Ok(builder::build(self.step, statement))
    }
}

impl Iterator for Steps<'_> {
    type Item = Result<Instruction, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == DriverState::Done {
            return None;
        }
        let Some(line) = self.lines.next() else {
            self.state = DriverState::Done;
            return None;
        };

        self.step += 1;
        match self.parse_line(&line) {
            Ok(instruction) => {
                info!(
                    step = self.step,
                    function = instruction.function_name(),
                    "{}",
                    line.text
                );
                Some(Ok(instruction))
            }
            Err(kind) => {
                warn!(step = self.step, line = line.text, "{}", kind);
                self.state = DriverState::Done;
                Some(Err(ParseError::new(
                    kind,
                    self.step,
                    line.text,
                    line.span,
                    self.file_id,
                )))
            }
        }
    }
}

impl std::iter::FusedIterator for Steps<'_> {}
