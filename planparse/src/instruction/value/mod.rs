use thiserror::Error;

use crate::parser::ParseOptions;
use crate::parser::tokenizer::{self, NestingError};

/// The classified right-hand side of a plain assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A quoted string. Plain literals are unwrapped and unescaped; f-strings
    /// keep their verbatim source text, prefix and quotes included.
    String(String),
    /// `[a, b, ...]`, holding the raw top-level elements.
    List(Vec<String>),
    /// `{k: v, ...}`, flattened to `[k1, v1, k2, v2, ...]` in source order.
    Dict(Vec<String>),
    /// Anything else (identifiers, numbers, expressions), passed through raw.
    Default(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error(transparent)]
    Nesting(#[from] NestingError),
    #[error("dict entry `{pair}` has no `:` separator")]
    DictPairWithoutColon { pair: String },
}

/// Classify a token with the default (strict) options.
pub fn classify(token: &str) -> Result<Value, LiteralError> {
    classify_with(token, &ParseOptions::default())
}

/// Classify a right-hand-side token as a string, list, dict or opaque value.
pub fn classify_with(token: &str, options: &ParseOptions) -> Result<Value, LiteralError> {
    let token = token.trim();

    if is_format_string(token) {
        return Ok(Value::String(token.to_string()));
    }
    if let Some(body) = quoted_body(token) {
        return Ok(Value::String(unescape(body)));
    }
    if let Some(body) = enclosed(token, '[') {
        return Ok(Value::List(tokenizer::tokenize(body)?));
    }
    if let Some(body) = enclosed(token, '{') {
        return Ok(Value::Dict(dict_entries(body, options)?));
    }
    Ok(Value::Default(token.to_string()))
}

/// Call arguments keep their raw text, except plain string literals, which
/// are handed over unquoted.
pub fn normalize_argument(argument: String) -> String {
    if is_format_string(&argument) {
        return argument;
    }
    match quoted_body(&argument) {
        Some(body) => unescape(body),
        None => argument,
    }
}

fn is_format_string(token: &str) -> bool {
    token
        .strip_prefix(['f', 'F'])
        .is_some_and(|rest| quoted_body(rest).is_some())
}

/// The text between the quotes when `token` is exactly one quoted literal.
fn quoted_body(token: &str) -> Option<&str> {
    if !token.starts_with(['"', '\'']) {
        return None;
    }
    let close = tokenizer::scan(token)
        .find(|(offset, c, before)| {
            before.quote.is_some()
                && before
                    .advance(*c, *offset)
                    .is_ok_and(|after| after.quote.is_none())
        })
        .map(|(offset, _, _)| offset)?;
    (close == token.len() - 1).then(|| &token[1..close])
}

/// The inner text when `token` is exactly one `open ... close` group.
fn enclosed(token: &str, open: char) -> Option<&str> {
    if !token.starts_with(open) {
        return None;
    }
    let close = tokenizer::closing_offset(token)?;
    (close == token.len() - 1).then(|| &token[1..close])
}

fn dict_entries(body: &str, options: &ParseOptions) -> Result<Vec<String>, LiteralError> {
    let mut entries = Vec::new();
    for pair in tokenizer::tokenize(body)? {
        let colon = tokenizer::top_level(&pair)
            .find(|(_, c)| *c == ':')
            .map(|(offset, _)| offset);
        match colon {
            Some(colon) => {
                entries.push(pair[..colon].trim().to_string());
                entries.push(pair[colon + 1..].trim().to_string());
            }
            None if options.lenient_dicts => {
                tracing::warn!(pair = %pair, "skipping dict entry without `:`");
            }
            None => return Err(LiteralError::DictPairWithoutColon { pair }),
        }
    }
    Ok(entries)
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(e @ ('"' | '\'' | '\\')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_unwrapped() {
        assert_eq!(classify(r#""hello""#), Ok(Value::String("hello".into())));
        assert_eq!(classify("'a, b'"), Ok(Value::String("a, b".into())));
        assert_eq!(
            classify(r#""say \"hi\"""#),
            Ok(Value::String(r#"say "hi""#.into()))
        );
    }

    #[test]
    fn format_strings_pass_through_verbatim() {
        assert_eq!(
            classify(r#"f"total: {a + b}""#),
            Ok(Value::String(r#"f"total: {a + b}""#.into()))
        );
    }

    #[test]
    fn adjacent_strings_are_not_one_literal() {
        assert_eq!(
            classify(r#""a", "b""#),
            Ok(Value::Default(r#""a", "b""#.into()))
        );
    }

    #[test]
    fn lists() {
        assert_eq!(
            classify("[1, 2, 3]"),
            Ok(Value::List(vec!["1".into(), "2".into(), "3".into()]))
        );
        assert_eq!(classify("[]"), Ok(Value::List(Vec::new())));
        assert_eq!(
            classify("[[1, 2], [3]]"),
            Ok(Value::List(vec!["[1, 2]".into(), "[3]".into()]))
        );
        assert_eq!(classify("[1][0]"), Ok(Value::Default("[1][0]".into())));
    }

    #[test]
    fn dicts_flatten_to_key_value_sequence() {
        assert_eq!(
            classify(r#"{ "note": "世界" , data : result[0] }"#),
            Ok(Value::Dict(vec![
                r#""note""#.into(),
                r#""世界""#.into(),
                "data".into(),
                "result[0]".into(),
            ]))
        );
        assert_eq!(classify("{}"), Ok(Value::Dict(Vec::new())));
    }

    #[test]
    fn colon_inside_key_string_is_not_the_separator() {
        assert_eq!(
            classify(r#"{"a:b": 1}"#),
            Ok(Value::Dict(vec![r#""a:b""#.into(), "1".into()]))
        );
    }

    #[test]
    fn dict_pair_without_colon() {
        assert_eq!(
            classify(r#"{"a": 1, "b"}"#),
            Err(LiteralError::DictPairWithoutColon { pair: r#""b""#.into() })
        );
        let lenient = ParseOptions { lenient_dicts: true };
        assert_eq!(
            classify_with(r#"{"a": 1, "b"}"#, &lenient),
            Ok(Value::Dict(vec![r#""a""#.into(), "1".into()]))
        );
    }

    #[test]
    fn everything_else_is_default() {
        for token in ["x", "42", "-1", "f(x)", "data[0:5]", "True"] {
            assert_eq!(classify(token), Ok(Value::Default(token.into())));
        }
    }

    #[test]
    fn normalize_argument_only_unwraps_plain_strings() {
        assert_eq!(normalize_argument(r#""x,y""#.into()), "x,y");
        assert_eq!(normalize_argument("'q'".into()), "q");
        assert_eq!(normalize_argument(r#"f"{a}""#.into()), r#"f"{a}""#);
        assert_eq!(normalize_argument("g(1)".into()), "g(1)");
        assert_eq!(normalize_argument("[1, 2]".into()), "[1, 2]");
    }
}
