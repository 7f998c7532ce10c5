use thiserror::Error;

// ---------------------------------------------------------------------------
// Scan state
// ---------------------------------------------------------------------------

/// Nesting problems found while scanning a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NestingError {
    #[error("unexpected `{delimiter}` at byte {offset}")]
    UnexpectedClose { delimiter: char, offset: usize },
    #[error("unclosed `{delimiter}`")]
    Unclosed { delimiter: char },
    #[error("unterminated {quote}-quoted string")]
    UnterminatedQuote { quote: char },
}

/// Nesting and quoting context at one point of a left-to-right scan.
///
/// The state is a plain value: [`ScanState::advance`] returns the state that
/// follows a character and never mutates in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    pub paren: u32,
    pub bracket: u32,
    pub brace: u32,
    /// The active quote character, if inside a string literal.
    pub quote: Option<char>,
    /// Set right after a backslash inside a string literal.
    escaped: bool,
}

impl ScanState {
    /// True outside every string literal and every `()`, `[]`, `{}` group.
    pub fn is_top_level(&self) -> bool {
        self.quote.is_none() && self.depth() == (0, 0, 0)
    }

    /// Nesting depth as `(paren, bracket, brace)`.
    pub fn depth(&self) -> (u32, u32, u32) {
        (self.paren, self.bracket, self.brace)
    }

    /// The state after consuming `c`, found at byte `offset` of the scanned text.
    pub fn advance(self, c: char, offset: usize) -> Result<ScanState, NestingError> {
        if let Some(quote) = self.quote {
            let next = if self.escaped {
                ScanState { escaped: false, ..self }
            } else if c == '\\' {
                ScanState { escaped: true, ..self }
            } else if c == quote {
                ScanState { quote: None, ..self }
            } else {
                self
            };
            return Ok(next);
        }

        let close = |depth: u32| {
            depth.checked_sub(1).ok_or(NestingError::UnexpectedClose {
                delimiter: c,
                offset,
            })
        };

        Ok(match c {
            '"' | '\'' => ScanState { quote: Some(c), ..self },
            '(' => ScanState { paren: self.paren + 1, ..self },
            ')' => ScanState { paren: close(self.paren)?, ..self },
            '[' => ScanState { bracket: self.bracket + 1, ..self },
            ']' => ScanState { bracket: close(self.bracket)?, ..self },
            '{' => ScanState { brace: self.brace + 1, ..self },
            '}' => ScanState { brace: close(self.brace)?, ..self },
            _ => self,
        })
    }

    /// Check that a finished scan left nothing open.
    pub fn finish(self) -> Result<(), NestingError> {
        if let Some(quote) = self.quote {
            return Err(NestingError::UnterminatedQuote { quote });
        }
        let delimiter = match self.depth() {
            (0, 0, 0) => return Ok(()),
            (p, _, _) if p > 0 => '(',
            (_, b, _) if b > 0 => '[',
            _ => '{',
        };
        Err(NestingError::Unclosed { delimiter })
    }
}

// ---------------------------------------------------------------------------
// Scanning helpers
// ---------------------------------------------------------------------------

/// Walk `text`, yielding each character's byte offset, the character, and the
/// scan state in effect *before* it. Iteration stops after the first character
/// that breaks nesting.
pub fn scan(text: &str) -> impl Iterator<Item = (usize, char, ScanState)> + '_ {
    text.char_indices()
        .scan(Some(ScanState::default()), |state, (offset, c)| {
            let before = (*state)?;
            *state = before.advance(c, offset).ok();
            Some((offset, c, before))
        })
}

/// Characters of `text` that sit at top level, with their byte offsets.
pub fn top_level(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    scan(text)
        .filter(|(_, _, before)| before.is_top_level())
        .map(|(offset, c, _)| (offset, c))
}

/// Verify that every quote and bracket in `text` is closed in order.
pub fn check_nesting(text: &str) -> Result<(), NestingError> {
    text.char_indices()
        .try_fold(ScanState::default(), |state, (offset, c)| {
            state.advance(c, offset)
        })?
        .finish()
}

/// Byte offset of the delimiter that closes the group opened by the first
/// character of `text`. `None` when `text` does not start with `(`, `[` or
/// `{`, or the group is never closed.
pub fn closing_offset(text: &str) -> Option<usize> {
    let mut chars = scan(text);
    let (_, open, _) = chars.next()?;
    let (close, depth) = match open {
        '(' => (')', (1, 0, 0)),
        '[' => (']', (0, 1, 0)),
        '{' => ('}', (0, 0, 1)),
        _ => return None,
    };
    chars
        .find(|(_, c, before)| *c == close && before.quote.is_none() && before.depth() == depth)
        .map(|(offset, _, _)| offset)
}

// ---------------------------------------------------------------------------
// Argument tokenizer
// ---------------------------------------------------------------------------

/// Split an argument list into its top-level arguments.
///
/// Commas split only at top level, so nested calls, list and dict literals,
/// and quoted strings stay whole. Each argument is trimmed; empty runs (as
/// left by a trailing comma) are dropped.
///
/// ```
/// use planparse::parser::tokenizer::tokenize;
///
/// let args = tokenize(r#"g(1, 2), [3, 4], "a,b]""#).unwrap();
/// assert_eq!(args, vec!["g(1, 2)", "[3, 4]", r#""a,b]""#]);
/// ```
pub fn tokenize(text: &str) -> Result<Vec<String>, NestingError> {
    let (state, mut arguments, start) = text.char_indices().try_fold(
        (ScanState::default(), Vec::new(), 0),
        |(state, mut arguments, start), (offset, c)| {
            if c == ',' && state.is_top_level() {
                push_argument(&mut arguments, &text[start..offset]);
                Ok::<_, NestingError>((state, arguments, offset + 1))
            } else {
                Ok((state.advance(c, offset)?, arguments, start))
            }
        },
    )?;
    state.finish()?;
    push_argument(&mut arguments, &text[start..]);
    Ok(arguments)
}

fn push_argument(arguments: &mut Vec<String>, run: &str) {
    let run = run.trim();
    if !run.is_empty() {
        arguments.push(run.to_string());
    }
}
