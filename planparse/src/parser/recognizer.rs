use crate::instruction::value::{self, LiteralError, Value};
use crate::parser::ParseOptions;
use crate::parser::tokenizer::{self, NestingError};

/// A recognized statement line, before step numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `name = <expr with a top-level + - * />`
    Arithmetic { target: String, expression: String },
    /// `name = fn(args)[index]`
    IndexedCall {
        target: String,
        function: String,
        arguments: Vec<String>,
        index: i64,
    },
    /// `name = fn(args)`
    CallAssignment {
        target: String,
        function: String,
        arguments: Vec<String>,
    },
    /// `fn(args)`
    BareCall {
        function: String,
        arguments: Vec<String>,
    },
    /// `name = collection[index]`
    ArrayAccess {
        target: String,
        collection: String,
        index: i64,
    },
    /// `name = value`
    Assignment { target: String, value: Value },
}

/// Outcome of one recognizer: `Ok(None)` declines the line.
pub type Recognition = Result<Option<Statement>, LiteralError>;

/// One entry of the recognizer chain.
#[derive(Clone, Copy)]
pub struct Recognizer {
    pub name: &'static str,
    pub recognize: fn(&str, &ParseOptions) -> Recognition,
}

impl Recognizer {
    /// Whether this recognizer takes responsibility for `line`, even if it
    /// then reports a malformed literal.
    pub fn claims(&self, line: &str, options: &ParseOptions) -> bool {
        !matches!((self.recognize)(line, options), Ok(None))
    }
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer").field("name", &self.name).finish()
    }
}

/// The chain, in precedence order. The first recognizer to claim a line wins.
pub const RECOGNIZERS: [Recognizer; 6] = [
    Recognizer {
        name: "arithmetic",
        recognize: arithmetic,
    },
    Recognizer {
        name: "indexed-call",
        recognize: indexed_call,
    },
    Recognizer {
        name: "call-assignment",
        recognize: call_assignment,
    },
    Recognizer {
        name: "bare-call",
        recognize: bare_call,
    },
    Recognizer {
        name: "array-access",
        recognize: array_access,
    },
    Recognizer {
        name: "assignment",
        recognize: assignment,
    },
];

/// Run the chain over one trimmed line. Returns the claiming recognizer's
/// name with its statement, or `None` when every recognizer declines.
pub fn recognize(
    line: &str,
    options: &ParseOptions,
) -> Result<Option<(&'static str, Statement)>, LiteralError> {
    for recognizer in &RECOGNIZERS {
        if let Some(statement) = (recognizer.recognize)(line, options)? {
            return Ok(Some((recognizer.name, statement)));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Recognizers
// ---------------------------------------------------------------------------

pub fn arithmetic(line: &str, _options: &ParseOptions) -> Recognition {
    let Some((target, expression)) = split_assignment(line) else {
        return Ok(None);
    };
    if !has_arithmetic_operator(expression) {
        return Ok(None);
    }
    Ok(Some(Statement::Arithmetic {
        target: target.to_string(),
        expression: expression.to_string(),
    }))
}

pub fn indexed_call(line: &str, _options: &ParseOptions) -> Recognition {
    let Some((target, rhs)) = split_assignment(line) else {
        return Ok(None);
    };
    let Some(call) = parse_call(rhs) else {
        return Ok(None);
    };
    let Some(index) = parse_index(call.suffix) else {
        return Ok(None);
    };
    Ok(Some(Statement::IndexedCall {
        target: target.to_string(),
        function: call.function.to_string(),
        arguments: call_arguments(call.arguments)?,
        index,
    }))
}

pub fn call_assignment(line: &str, _options: &ParseOptions) -> Recognition {
    let Some((target, rhs)) = split_assignment(line) else {
        return Ok(None);
    };
    let Some(call) = parse_call(rhs).filter(|c| c.suffix.is_empty()) else {
        return Ok(None);
    };
    Ok(Some(Statement::CallAssignment {
        target: target.to_string(),
        function: call.function.to_string(),
        arguments: call_arguments(call.arguments)?,
    }))
}

pub fn bare_call(line: &str, _options: &ParseOptions) -> Recognition {
    if assignment_offset(line).is_some() {
        return Ok(None);
    }
    let Some(call) = parse_call(line).filter(|c| c.suffix.is_empty()) else {
        return Ok(None);
    };
    Ok(Some(Statement::BareCall {
        function: call.function.to_string(),
        arguments: call_arguments(call.arguments)?,
    }))
}

pub fn array_access(line: &str, _options: &ParseOptions) -> Recognition {
    let Some((target, rhs)) = split_assignment(line) else {
        return Ok(None);
    };
    let Some(open) = rhs.find('[') else {
        return Ok(None);
    };
    let collection = rhs[..open].trim_end();
    if !is_identifier(collection) {
        return Ok(None);
    }
    let Some(index) = parse_index(&rhs[open..]) else {
        return Ok(None);
    };
    Ok(Some(Statement::ArrayAccess {
        target: target.to_string(),
        collection: collection.to_string(),
        index,
    }))
}

pub fn assignment(line: &str, options: &ParseOptions) -> Recognition {
    let Some((target, rhs)) = split_assignment(line) else {
        return Ok(None);
    };
    let value = value::classify_with(rhs, options)?;
    Ok(Some(Statement::Assignment {
        target: target.to_string(),
        value,
    }))
}

// ---------------------------------------------------------------------------
// Shape helpers
// ---------------------------------------------------------------------------

struct Call<'a> {
    function: &'a str,
    arguments: &'a str,
    /// Whatever follows the closing parenthesis, trimmed.
    suffix: &'a str,
}

/// `ident(...)` followed by an optional suffix.
fn parse_call(text: &str) -> Option<Call<'_>> {
    let open = text.find('(')?;
    let function = text[..open].trim_end();
    if !is_identifier(function) {
        return None;
    }
    let close = open + tokenizer::closing_offset(&text[open..])?;
    Some(Call {
        function,
        arguments: &text[open + 1..close],
        suffix: text[close + 1..].trim(),
    })
}

fn call_arguments(arguments: &str) -> Result<Vec<String>, NestingError> {
    Ok(tokenizer::tokenize(arguments)?
        .into_iter()
        .map(value::normalize_argument)
        .collect())
}

/// `[n]` or `[-n]`, nothing more.
fn parse_index(text: &str) -> Option<i64> {
    text.strip_prefix('[')?
        .strip_suffix(']')?
        .trim()
        .parse()
        .ok()
}

/// Byte offset of the assignment `=`: the first top-level `=` that is not
/// part of `==`, `!=`, `<=` or `>=`.
fn assignment_offset(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    tokenizer::top_level(line)
        .find(|&(offset, c)| {
            c == '='
                && !matches!(offset.checked_sub(1).map(|i| bytes[i]), Some(b'=' | b'!' | b'<' | b'>'))
                && bytes.get(offset + 1) != Some(&b'=')
        })
        .map(|(offset, _)| offset)
}

/// `(target, right-hand side)` when the line is `identifier = something`.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let offset = assignment_offset(line)?;
    let target = line[..offset].trim();
    let rhs = line[offset + 1..].trim();
    (is_identifier(target) && !rhs.is_empty()).then_some((target, rhs))
}

fn has_arithmetic_operator(expression: &str) -> bool {
    tokenizer::top_level(expression).any(|(_, c)| matches!(c, '+' | '-' | '*' | '/'))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
