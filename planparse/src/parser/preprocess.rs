use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Parser as CmarkParser, Tag, TagEnd};

/// Fence markers, each with the character its runs are made of.
const FENCES: [(&str, char); 2] = [("```", '`'), ("~~~", '~')];

/// One statement line left after preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// The trimmed line text.
    pub text: &'a str,
    /// Byte span of `text` within the original source.
    pub span: Range<usize>,
}

/// Strip code fences, then drop blank and `#` comment lines.
///
/// Every returned line borrows from `source` and keeps its byte span there,
/// so diagnostics can point at the original text.
pub fn preprocess(source: &str) -> Vec<SourceLine<'_>> {
    let region = code_region(source);
    let mut offset = region.start;
    let mut lines = Vec::new();

    for raw in source[region].split_inclusive('\n') {
        let start = offset;
        offset += raw.len();

        let trimmed = raw.trim();
        let text = strip_fence(trimmed).unwrap_or(trimmed);
        if is_skippable(text) {
            continue;
        }
        let leading = raw.len() - raw.trim_start().len();
        let begin = start + leading;
        lines.push(SourceLine {
            text,
            span: begin..begin + text.len(),
        });
    }

    lines
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Byte range holding the pseudocode: the body of the first closed fenced
/// block that holds any text, otherwise the whole source.
fn code_region(source: &str) -> Range<usize> {
    if !FENCES.iter().any(|(marker, _)| source.contains(marker)) {
        return 0..source.len();
    }

    let mut body: Option<Range<usize>> = None;
    let mut in_fence = false;

    for (event, range) in CmarkParser::new(source).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                in_fence = true;
                body = None;
            }
            Event::Text(_) if in_fence => {
                body = Some(match body {
                    Some(b) => b.start..range.end,
                    None => range,
                });
            }
            Event::End(TagEnd::CodeBlock) if in_fence => {
                in_fence = false;
                let code = body
                    .take()
                    .filter(|b| !source[b.clone()].trim().is_empty());
                if let Some(code) = code.filter(|_| is_closed(&source[range])) {
                    return code;
                }
            }
            _ => {}
        }
    }

    // No closed block with code: marker lines are dropped one by one.
    0..source.len()
}

/// Whether a fenced block's source text ends with its own closing fence.
fn is_closed(block: &str) -> bool {
    let block = block.trim_end();
    block.contains('\n')
        && block
            .rsplit('\n')
            .next()
            .is_some_and(|last| FENCES.iter().any(|(marker, _)| last.trim_start().starts_with(marker)))
}

/// For a fence delimiter line, the part of it that is still code.
///
/// A line starting with a marker is all fence. A marker that follows prose
/// and carries an info string opens a block, so the prose goes. A bare
/// trailing marker closes one, so the code before it stays. Markers inside
/// string literals are left alone.
fn strip_fence(line: &str) -> Option<&str> {
    FENCES.iter().find_map(|&(marker, fence)| {
        if line.starts_with(marker) {
            return Some("");
        }
        let at = line.find(marker)?;
        let info = line[at..].trim_start_matches(fence).trim();
        if info.is_empty() {
            Some(line[..at].trim_end())
        } else if info.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+')) {
            Some("")
        } else {
            None
        }
    })
}
