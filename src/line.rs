//! The line classifier — splits a document into [`Line`] records and
//! classifies each into one of eight kinds.
//!
//! This is deliberately the first and simplest pass: it never looks at
//! neighboring lines or nesting, only at the line's own text. The block
//! parser (`crate::block`) is what turns a flat stream of classified lines
//! into a tree; keeping classification context-free here is what lets a
//! comment or a blank line be transparent to frame structure no matter
//! where it appears — the parser just filters them out up front.

use crate::error::{ParseError, ParseErrorKind};

/// The eight line kinds. Declaration order here has no significance;
/// `classify` applies the priority rules explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    ListItem,
    StringItem,
    KeyItem,
    Inline,
    DictItem,
    Unrecognized,
}

/// One classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub raw: String,
    pub line_number: usize,
    pub kind: LineKind,
    pub indent: usize,
    /// Key text for `dict-item`/`key-item` lines (not stripped for
    /// `key-item`; stripped of surrounding spaces for `dict-item`).
    pub key: Option<String>,
    pub key_column: Option<usize>,
    /// Rest-of-line value text for `list-item`/`string-item`/`dict-item`/
    /// `inline` lines. `None` means "no rest-of-line value" — the entry
    /// expects an indented child (or defaults to the empty string).
    pub value: Option<String>,
    pub value_column: Option<usize>,
}

/// Split `text` into raw lines at any of CR, LF, or CRLF, in document
/// order. The terminator itself is not included in the returned slices.
fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Classify an entire document into a stream of [`Line`] records.
///
/// `source` is the caller-supplied label attached to any [`ParseError`]
/// raised here (tab-in-indentation is the only error this stage itself
/// raises — everything else is a structural judgment the block parser
/// makes once it sees the classified stream).
pub fn classify(text: &str, source: &str) -> Result<Vec<Line>, ParseError> {
    let raw_lines = split_lines(text);
    let mut lines = Vec::with_capacity(raw_lines.len());
    for (line_number, raw) in raw_lines.into_iter().enumerate() {
        lines.push(classify_line(raw, line_number, source)?);
    }
    Ok(lines)
}

fn classify_line(raw: &str, line_number: usize, source: &str) -> Result<Line, ParseError> {
    // Priority 1: blank (empty, or only spaces/tabs) — checked before tab
    // detection, so a blank line is never a tab-in-indentation error.
    if raw.trim().is_empty() {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::Blank,
            indent: 0,
            key: None,
            key_column: None,
            value: None,
            value_column: None,
        });
    }

    // Leading-whitespace scan: spaces count toward indent; any tab among
    // them is an error regardless of position in the run.
    let bytes = raw.as_bytes();
    let mut indent = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b' ' => indent += 1,
            b'\t' => {
                return Err(ParseError::new(
                    source,
                    ParseErrorKind::TabInIndentation,
                    "tab in indentation",
                    line_number,
                    i,
                    raw,
                    vec![(line_number, raw.to_string())],
                ));
            }
            _ => break,
        }
    }

    let content = &raw[indent..];

    // Priority 2: comment.
    if content.starts_with('#') {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::Comment,
            indent,
            key: None,
            key_column: None,
            value: None,
            value_column: None,
        });
    }

    // Priority 3: list-item.
    if let Some(rest) = content.strip_prefix("- ") {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::ListItem,
            indent,
            key: None,
            key_column: None,
            value: Some(rest.to_string()),
            value_column: Some(indent + 2),
        });
    }
    if content == "-" {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::ListItem,
            indent,
            key: None,
            key_column: None,
            value: None,
            value_column: None,
        });
    }

    // Priority 4: string-item.
    if let Some(rest) = content.strip_prefix("> ") {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::StringItem,
            indent,
            key: None,
            key_column: None,
            value: Some(rest.to_string()),
            value_column: Some(indent + 2),
        });
    }
    if content == ">" {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::StringItem,
            indent,
            key: None,
            key_column: None,
            value: Some(String::new()),
            value_column: Some(indent + 1),
        });
    }

    // Priority 5: key-item (multiline-key continuation).
    if let Some(rest) = content.strip_prefix(": ") {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::KeyItem,
            indent,
            key: Some(rest.to_string()),
            key_column: Some(indent),
            value: None,
            value_column: None,
        });
    }
    if content == ":" {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::KeyItem,
            indent,
            key: Some(String::new()),
            key_column: Some(indent),
            value: None,
            value_column: None,
        });
    }

    // Priority 6: inline.
    if content.starts_with('{') || content.starts_with('[') {
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::Inline,
            indent,
            key: None,
            key_column: None,
            value: Some(content.to_string()),
            value_column: Some(indent),
        });
    }

    // Priority 7: dict-item — first `: ` or a terminating `:` at EOL,
    // scanned left to right with no quoting.
    if let Some(pos) = find_dict_tag(content) {
        let key_text = content[..pos].trim().to_string();
        let after = &content[pos..];
        let value = after.strip_prefix(": ").map(|v| v.to_string());
        return Ok(Line {
            raw: raw.to_string(),
            line_number,
            kind: LineKind::DictItem,
            indent,
            key: Some(key_text),
            key_column: Some(indent),
            value_column: value.as_ref().map(|_| indent + pos + 2),
            value,
        });
    }

    // Priority 8: unrecognized.
    Ok(Line {
        raw: raw.to_string(),
        line_number,
        kind: LineKind::Unrecognized,
        indent,
        key: None,
        key_column: None,
        value: None,
        value_column: None,
    })
}

/// Find the position (relative to `content`) of the `: ` tag or a
/// terminating `:` at end-of-line. Returns `None` if neither is present.
fn find_dict_tag(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<LineKind> {
        classify(text, "<test>").unwrap().iter().map(|l| l.kind).collect()
    }

    #[test]
    fn classifies_basic_mapping() {
        let lines = classify("name: Katheryn\nphone: 555", "<test>").unwrap();
        assert_eq!(lines[0].kind, LineKind::DictItem);
        assert_eq!(lines[0].key.as_deref(), Some("name"));
        assert_eq!(lines[0].value.as_deref(), Some("Katheryn"));
        assert_eq!(lines[1].key.as_deref(), Some("phone"));
    }

    #[test]
    fn blank_line_with_only_tabs_is_blank_not_an_error() {
        let lines = classify("a: 1\n\t\nb: 2", "<test>").unwrap();
        assert_eq!(lines[1].kind, LineKind::Blank);
    }

    #[test]
    fn tab_in_indentation_is_an_error() {
        let err = classify("root:\n\tchild: x", "<test>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TabInIndentation);
        assert_eq!(err.line_number, 1);
        assert_eq!(err.column, 0);
    }

    #[test]
    fn list_item_without_value_has_no_rest_of_line() {
        let lines = classify("-", "<test>").unwrap();
        assert_eq!(lines[0].kind, LineKind::ListItem);
        assert_eq!(lines[0].value, None);
    }

    #[test]
    fn list_item_with_empty_value_is_some_empty_string() {
        let lines = classify("- ", "<test>").unwrap();
        assert_eq!(lines[0].value.as_deref(), Some(""));
    }

    #[test]
    fn string_item_preserves_trailing_spaces() {
        let lines = classify(">   trailing   ", "<test>").unwrap();
        assert_eq!(lines[0].value.as_deref(), Some("  trailing   "));
    }

    #[test]
    fn bare_string_tag_contributes_empty_string() {
        let lines = classify(">", "<test>").unwrap();
        assert_eq!(lines[0].value.as_deref(), Some(""));
    }

    #[test]
    fn dict_item_with_terminating_colon_has_no_value() {
        let lines = classify("kids:", "<test>").unwrap();
        assert_eq!(lines[0].value, None);
        assert_eq!(lines[0].key.as_deref(), Some("kids"));
    }

    #[test]
    fn inline_line_classified_by_leading_bracket() {
        let lines = classify("{a: 1}", "<test>").unwrap();
        assert_eq!(lines[0].kind, LineKind::Inline);
    }

    #[test]
    fn comment_and_blank_are_recognized() {
        assert_eq!(kinds("# hi\n\nname: x"), vec![LineKind::Comment, LineKind::Blank, LineKind::DictItem]);
    }

    #[test]
    fn key_item_joins_later() {
        let lines = classify(": first\n: second", "<test>").unwrap();
        assert_eq!(lines[0].kind, LineKind::KeyItem);
        assert_eq!(lines[0].key.as_deref(), Some("first"));
        assert_eq!(lines[1].key.as_deref(), Some("second"));
    }

    #[test]
    fn unrecognized_line_has_no_tag() {
        let lines = classify("just some text with no tag", "<test>").unwrap();
        assert_eq!(lines[0].kind, LineKind::Unrecognized);
    }
}
