//! The inline parser — single-line `{...}` and `[...]` values.
//!
//! Unlike the block grammar, inline NestedText has no escaping at all:
//! a string is just "any run of characters not containing one of a
//! handful of structural characters." That makes this parser much
//! smaller than a typical quoted-string tokenizer — there's no
//! backslash handling to get wrong, only bracket/brace/comma/colon
//! bookkeeping and leading/trailing whitespace trimming.

use crate::error::{ParseError, ParseErrorKind};
use crate::keymap::{Keymap, Location};
use crate::value::{KeyPath, KeyPathSegment, Value};

/// Parse a self-contained inline value starting at `line`'s first
/// non-space character. `line_number`/`base_column` locate the start of
/// `text` within the document, for error reporting.
///
/// When `keymap` is `Some`, a [`Location`] is recorded for every node the
/// inline grammar produces — including interior mappings/sequences and
/// their members, not just leaves — keyed by `path` extended with each
/// member's segment. Every recorded location shares the inline value's
/// single source line; only the column advances as parsing proceeds
/// across it.
pub fn parse_inline(
    text: &str,
    line_number: usize,
    base_column: usize,
    source: &str,
    path: &mut KeyPath,
    keymap: &mut Option<Keymap>,
) -> Result<Value, ParseError> {
    let mut p = InlineParser {
        chars: text.chars().collect(),
        pos: 0,
        line_number,
        base_column,
        source: source.to_string(),
        line_text: text.to_string(),
    };
    let value = p.parse_value(path, keymap)?;
    p.skip_ws();
    if p.pos != p.chars.len() {
        return Err(p.err(format!(
            "unexpected text after closing bracket: {:?}",
            p.remainder()
        )));
    }
    Ok(value)
}

struct InlineParser {
    chars: Vec<char>,
    pos: usize,
    line_number: usize,
    base_column: usize,
    source: String,
    line_text: String,
}

/// Where an inline string is being read from — controls which characters
/// are forbidden (colon is only special inside a mapping).
#[derive(Clone, Copy, PartialEq, Eq)]
enum StringCtx {
    Key,
    ListValue,
}

impl InlineParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn remainder(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(
            self.source.clone(),
            ParseErrorKind::InlineSyntax,
            message,
            self.line_number,
            self.base_column + self.pos,
            self.line_text.clone(),
            vec![(self.line_number, self.line_text.clone())],
        )
    }

    /// Record a plain (no key fields) location for `path` at `start_col`,
    /// pointing at this inline value's own source line.
    fn record_value(&self, path: &KeyPath, keymap: &mut Option<Keymap>, start_col: usize) {
        if let Some(km) = keymap.as_mut() {
            km.insert(
                path.clone(),
                Location {
                    line: self.line_number,
                    column: start_col,
                    key_line: None,
                    key_column: None,
                    raw_key: None,
                },
            );
        }
    }

    fn parse_value(&mut self, path: &mut KeyPath, keymap: &mut Option<Keymap>) -> Result<Value, ParseError> {
        let start_col = self.base_column + self.pos;
        let value = match self.peek() {
            Some('{') => self.parse_dict(path, keymap)?,
            Some('[') => self.parse_list(path, keymap)?,
            _ => Value::String(self.parse_string(StringCtx::ListValue)?),
        };
        self.record_value(path, keymap, start_col);
        Ok(value)
    }

    fn parse_dict(&mut self, path: &mut KeyPath, keymap: &mut Option<Keymap>) -> Result<Value, ParseError> {
        self.pos += 1; // consume '{'
        let mut entries = Vec::new();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(Value::Mapping(entries));
        }
        loop {
            let key_col = self.base_column + self.pos;
            let key = self.parse_string(StringCtx::Key)?;
            match self.peek() {
                Some(':') => self.pos += 1,
                _ => return Err(self.err("expected ':' after inline key")),
            }
            let value_col = self.base_column + self.pos;
            path.push(KeyPathSegment::Key(key.clone()));
            let value = self.parse_value(path, keymap)?;
            if let Some(km) = keymap.as_mut() {
                km.insert(
                    path.clone(),
                    Location {
                        line: self.line_number,
                        column: value_col,
                        key_line: Some(self.line_number),
                        key_column: Some(key_col),
                        raw_key: Some(key.clone()),
                    },
                );
            }
            path.pop();
            entries.push((key, value));
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    if self.peek() == Some('}') {
                        return Err(self.err("trailing comma before '}'"));
                    }
                }
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or '}' in inline mapping")),
            }
        }
        Ok(Value::Mapping(entries))
    }

    fn parse_list(&mut self, path: &mut KeyPath, keymap: &mut Option<Keymap>) -> Result<Value, ParseError> {
        self.pos += 1; // consume '['
        let mut items = Vec::new();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(Value::Sequence(items));
        }
        loop {
            path.push(KeyPathSegment::Index(items.len()));
            let value = self.parse_value(path, keymap)?;
            path.pop();
            items.push(value);
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    if self.peek() == Some(']') {
                        return Err(self.err("trailing comma before ']'"));
                    }
                }
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or ']' in inline sequence")),
            }
        }
        Ok(Value::Sequence(items))
    }

    /// Read a run of characters forbidden from containing `[`, `]`, `{`,
    /// `}`, `,`, or a newline — and, for keys, `:` as well — then trim
    /// leading/trailing whitespace.
    fn parse_string(&mut self, ctx: StringCtx) -> Result<String, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let stop = matches!(c, '[' | ']' | '{' | '}' | ',' | '\n')
                || (ctx == StringCtx::Key && c == ':');
            if stop {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start && self.peek().is_none() {
            return Err(self.err("unexpected end of input, unmatched bracket"));
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        Ok(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        let mut path = Vec::new();
        let mut keymap = None;
        parse_inline(s, 0, 0, "<test>", &mut path, &mut keymap).unwrap()
    }

    fn parse_with_keymap(s: &str) -> (Value, Keymap) {
        let mut path = Vec::new();
        let mut keymap = Some(Keymap::new());
        let value = parse_inline(s, 0, 0, "<test>", &mut path, &mut keymap).unwrap();
        (value, keymap.unwrap())
    }

    #[test]
    fn empty_dict_and_list() {
        assert_eq!(parse("{}"), Value::Mapping(vec![]));
        assert_eq!(parse("[]"), Value::Sequence(vec![]));
    }

    #[test]
    fn single_space_list_is_one_empty_string() {
        assert_eq!(parse("[ ]"), Value::Sequence(vec![Value::String(String::new())]));
    }

    #[test]
    fn nested_inline_structures() {
        let v = parse("{a: [1, 2], b: {c: 3}}");
        let m = v.as_mapping().unwrap();
        assert_eq!(m[0].0, "a");
        assert_eq!(m[0].1, Value::Sequence(vec![Value::string("1"), Value::string("2")]));
        assert_eq!(m[1].1.get("c").unwrap().as_str(), Some("3"));
    }

    #[test]
    fn values_trim_surrounding_whitespace() {
        let v = parse("[ a ,  b  ]");
        assert_eq!(v, Value::Sequence(vec![Value::string("a"), Value::string("b")]));
    }

    #[test]
    fn value_may_contain_colon_outside_mapping() {
        let v = parse("[a:b, c]");
        assert_eq!(v, Value::Sequence(vec![Value::string("a:b"), Value::string("c")]));
    }

    #[test]
    fn trailing_comma_is_an_error() {
        let mut path = Vec::new();
        let mut keymap = None;
        assert!(parse_inline("[a,]", 0, 0, "<test>", &mut path, &mut keymap).is_err());
        assert!(parse_inline("{a: 1,}", 0, 0, "<test>", &mut path, &mut keymap).is_err());
    }

    #[test]
    fn unmatched_bracket_is_an_error() {
        let mut path = Vec::new();
        let mut keymap = None;
        assert!(parse_inline("[a, b", 0, 0, "<test>", &mut path, &mut keymap).is_err());
    }

    #[test]
    fn garbage_after_close_is_an_error() {
        let mut path = Vec::new();
        let mut keymap = None;
        assert!(parse_inline("[a] extra", 0, 0, "<test>", &mut path, &mut keymap).is_err());
    }

    #[test]
    fn keymap_covers_nested_inline_members() {
        let (_, km) = parse_with_keymap("{a: [1, 2], b: {c: 3}}");
        assert!(km.location(&[]).is_some());
        assert!(km.location(&[KeyPathSegment::Key("a".into())]).is_some());
        assert!(km.location(&[KeyPathSegment::Key("a".into()), KeyPathSegment::Index(0)]).is_some());
        assert!(km.location(&[KeyPathSegment::Key("b".into())]).is_some());
        assert!(km.location(&[KeyPathSegment::Key("b".into()), KeyPathSegment::Key("c".into())]).is_some());
    }

    #[test]
    fn keymap_records_key_position_for_inline_mapping_entries() {
        let (_, km) = parse_with_keymap("{name: Ada}");
        let loc = km.location(&[KeyPathSegment::Key("name".into())]).unwrap();
        assert_eq!(loc.key_column, Some(1));
        assert_eq!(loc.raw_key.as_deref(), Some("name"));
    }
}
