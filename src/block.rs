//! The block parser — recognizes nesting via indentation and assembles
//! `Value` trees from a classified [`Line`] stream.
//!
//! Each nested value is parsed by a dedicated recursive call rather than by
//! manipulating an explicit stack of frames: a "frame" is exactly one
//! activation of `parse_mapping`/`parse_sequence`/`parse_multiline_string`
//! here. Recursion gives us the stack for free and makes the indentation
//! invariant — a frame's own lines are all at exactly one indent,
//! established by its first line — a precondition every function below
//! can simply assume on entry rather than re-derive.

use crate::error::{ParseError, ParseErrorKind};
use crate::inline;
use crate::keymap::{Keymap, Location};
use crate::line::{Line, LineKind};
use crate::loader::{LoadOptions, OnDup, Top};
use crate::value::{KeyPath, KeyPathSegment, Value};

/// Parse a full document: classified lines in, root `Value` out, with an
/// optional keymap populated along the way.
///
/// `top` type-checking and the empty-document default are applied here,
/// at the one place that sees both the parsed value and the option that
/// constrains it.
pub fn parse_document(
    lines: &[Line],
    source: &str,
    opts: &LoadOptions,
    keymap: &mut Option<Keymap>,
) -> Result<Option<Value>, ParseError> {
    let i = significant(lines, 0);
    if i >= lines.len() {
        return Ok(empty_for_top(opts.top));
    }

    let first = &lines[i];
    let mut path: KeyPath = Vec::new();
    let (value, next) = match first.kind {
        LineKind::Inline => {
            let text = first.value.as_deref().unwrap_or("");
            let col = first.value_column.unwrap_or(first.indent);
            let v = inline::parse_inline(text, first.line_number, col, source, &mut path, keymap)?;
            (v, i + 1)
        }
        LineKind::ListItem => parse_sequence(lines, i, first.indent, source, opts, &mut path, keymap)?,
        LineKind::DictItem | LineKind::KeyItem => {
            parse_mapping(lines, i, first.indent, source, opts, &mut path, keymap)?
        }
        LineKind::StringItem => parse_multiline_string(lines, i, first.indent, source, opts, &mut path, keymap)?,
        _ => return Err(structure_error(lines, i, source)),
    };

    let j = significant(lines, next);
    if j < lines.len() {
        return Err(structure_error(lines, j, source));
    }

    check_top(&value, opts.top, first.line_number, source)?;

    if let Some(km) = keymap.as_mut() {
        let root_loc = Location {
            line: first.line_number,
            column: first.value_column.unwrap_or(first.indent),
            key_line: None,
            key_column: None,
            raw_key: None,
        };
        km.insert(Vec::new(), root_loc);
    }

    Ok(Some(value))
}

fn empty_for_top(top: Top) -> Option<Value> {
    match top {
        Top::Any => None,
        Top::Dict => Some(Value::Mapping(Vec::new())),
        Top::List => Some(Value::Sequence(Vec::new())),
        Top::Str => Some(Value::String(String::new())),
    }
}

fn check_top(value: &Value, top: Top, line: usize, source: &str) -> Result<(), ParseError> {
    let ok = match top {
        Top::Any => true,
        Top::Dict => value.is_mapping(),
        Top::List => value.is_sequence(),
        Top::Str => value.is_string(),
    };
    if ok {
        Ok(())
    } else {
        Err(ParseError::new(
            source,
            ParseErrorKind::TopLevelTypeMismatch,
            format!("wrong top-level type, expected {top:?}"),
            line,
            0,
            String::new(),
            Vec::new(),
        ))
    }
}

/// First index at or after `i` whose line is neither blank nor a comment.
/// Returns `lines.len()` when none remains.
fn significant(lines: &[Line], mut i: usize) -> usize {
    while i < lines.len() && matches!(lines[i].kind, LineKind::Blank | LineKind::Comment) {
        i += 1;
    }
    i
}

/// Dispatch into a freshly-opened child frame. `idx` is the index of the
/// child's first line; the caller has already verified its indent is
/// strictly greater than the parent frame's.
fn parse_child(
    lines: &[Line],
    idx: usize,
    source: &str,
    opts: &LoadOptions,
    path: &mut KeyPath,
    keymap: &mut Option<Keymap>,
) -> Result<(Value, usize), ParseError> {
    let line = &lines[idx];
    let child_indent = line.indent;
    match line.kind {
        LineKind::DictItem | LineKind::KeyItem => {
            parse_mapping(lines, idx, child_indent, source, opts, path, keymap)
        }
        LineKind::ListItem => parse_sequence(lines, idx, child_indent, source, opts, path, keymap),
        LineKind::StringItem => parse_multiline_string(lines, idx, child_indent, source, opts, path, keymap),
        LineKind::Inline => {
            let text = line.value.as_deref().unwrap_or("");
            let col = line.value_column.unwrap_or(line.indent);
            let v = inline::parse_inline(text, line.line_number, col, source, path, keymap)?;
            Ok((v, significant(lines, idx + 1)))
        }
        _ => Err(structure_error(lines, idx, source)),
    }
}

/// Parse a Mapping frame. `start` must index a `DictItem`/`KeyItem` line at
/// `indent`; returns the assembled mapping and the index of the first line
/// past the frame (a line at lesser indent, or `lines.len()`).
fn parse_mapping(
    lines: &[Line],
    start: usize,
    indent: usize,
    source: &str,
    opts: &LoadOptions,
    path: &mut KeyPath,
    keymap: &mut Option<Keymap>,
) -> Result<(Value, usize), ParseError> {
    let mut entries: Vec<(String, Value)> = Vec::new();
    let mut idx = start;
    let mut last_rest_of_line: Option<usize> = None;

    loop {
        let line = &lines[idx];
        let next_idx = match line.kind {
            LineKind::DictItem => {
                last_rest_of_line = None;
                let raw_key = line.key.clone().unwrap_or_default();
                let key_line = line.line_number;
                let key_column = line.key_column.unwrap_or(line.indent);

                if let Some(rest) = line.value.clone() {
                    last_rest_of_line = Some(key_line);
                    let value_column = line.value_column.unwrap_or(key_column);
                    let normalized = normalize(opts, &raw_key, path);
                    path.push(KeyPathSegment::Key(normalized));
                    let value = rest_of_line_value(&rest, key_line, value_column, source, path, keymap)?;
                    path.pop();
                    let value_loc = Location {
                        line: key_line,
                        column: value_column,
                        key_line: Some(key_line),
                        key_column: Some(key_column),
                        raw_key: Some(raw_key.clone()),
                    };
                    insert_entry(&mut entries, opts, source, path, raw_key, key_line, value, value_loc, keymap)?;
                    significant(lines, idx + 1)
                } else {
                    let peek = significant(lines, idx + 1);
                    if peek < lines.len() && lines[peek].indent > indent {
                        let normalized = normalize(opts, &raw_key, path);
                        path.push(KeyPathSegment::Key(normalized));
                        let (child, next) = parse_child(lines, peek, source, opts, path, keymap)?;
                        path.pop();
                        let value_loc = Location {
                            line: lines[peek].line_number,
                            column: lines[peek].value_column.unwrap_or(lines[peek].indent),
                            key_line: Some(key_line),
                            key_column: Some(key_column),
                            raw_key: Some(raw_key.clone()),
                        };
                        insert_entry(&mut entries, opts, source, path, raw_key, key_line, child, value_loc, keymap)?;
                        significant(lines, next)
                    } else {
                        let value_loc = Location {
                            line: key_line,
                            column: key_column,
                            key_line: Some(key_line),
                            key_column: Some(key_column),
                            raw_key: Some(raw_key.clone()),
                        };
                        insert_entry(
                            &mut entries,
                            opts,
                            source,
                            path,
                            raw_key,
                            key_line,
                            Value::String(String::new()),
                            value_loc,
                            keymap,
                        )?;
                        significant(lines, idx + 1)
                    }
                }
            }
            LineKind::KeyItem => {
                last_rest_of_line = None;
                let first_key_line = line.line_number;
                let key_column = line.key_column.unwrap_or(line.indent);
                let mut fragments = Vec::new();
                let mut j = idx;
                while j < lines.len() && lines[j].kind == LineKind::KeyItem && lines[j].indent == indent {
                    fragments.push(lines[j].key.clone().unwrap_or_default());
                    j = significant(lines, j + 1);
                }
                let raw_key = fragments.join("\n");

                if j < lines.len() && lines[j].indent > indent {
                    let normalized = normalize(opts, &raw_key, path);
                    path.push(KeyPathSegment::Key(normalized));
                    let (child, next) = parse_child(lines, j, source, opts, path, keymap)?;
                    path.pop();
                    let value_loc = Location {
                        line: lines[j].line_number,
                        column: lines[j].value_column.unwrap_or(lines[j].indent),
                        key_line: Some(first_key_line),
                        key_column: Some(key_column),
                        raw_key: Some(raw_key.clone()),
                    };
                    insert_entry(&mut entries, opts, source, path, raw_key, first_key_line, child, value_loc, keymap)?;
                    significant(lines, next)
                } else {
                    return Err(ParseError::new(
                        source,
                        ParseErrorKind::MultilineKeyWithoutValue,
                        "multiline key without indented value",
                        first_key_line,
                        key_column,
                        line.raw.clone(),
                        context(lines, idx),
                    ));
                }
            }
            _ => return Err(indentation_or_unrecognized(lines, idx, source, last_rest_of_line)),
        };

        idx = next_idx;
        if idx >= lines.len() {
            break;
        }
        let nxt = &lines[idx];
        if nxt.indent == indent {
            if !matches!(nxt.kind, LineKind::DictItem | LineKind::KeyItem) {
                return Err(indentation_or_unrecognized(lines, idx, source, last_rest_of_line));
            }
            continue;
        } else if nxt.indent < indent {
            break;
        } else {
            return Err(indentation_or_unrecognized(lines, idx, source, last_rest_of_line));
        }
    }

    Ok((Value::Mapping(entries), idx))
}

/// Parse a Sequence frame. `start` must index a `ListItem` line at `indent`.
fn parse_sequence(
    lines: &[Line],
    start: usize,
    indent: usize,
    source: &str,
    opts: &LoadOptions,
    path: &mut KeyPath,
    keymap: &mut Option<Keymap>,
) -> Result<(Value, usize), ParseError> {
    let mut items: Vec<Value> = Vec::new();
    let mut idx = start;
    let mut last_rest_of_line: Option<usize> = None;

    loop {
        let line = &lines[idx];
        path.push(KeyPathSegment::Index(items.len()));
        last_rest_of_line = None;

        let next_idx = if let Some(rest) = line.value.clone() {
            last_rest_of_line = Some(line.line_number);
            let value_column = line.value_column.unwrap_or(line.indent);
            let value = rest_of_line_value(&rest, line.line_number, value_column, source, path, keymap)?;
            if let Some(km) = keymap.as_mut() {
                km.insert(
                    path.clone(),
                    Location {
                        line: line.line_number,
                        column: value_column,
                        key_line: None,
                        key_column: None,
                        raw_key: None,
                    },
                );
            }
            items.push(value);
            significant(lines, idx + 1)
        } else {
            let peek = significant(lines, idx + 1);
            if peek < lines.len() && lines[peek].indent > indent {
                let (child, next) = parse_child(lines, peek, source, opts, path, keymap)?;
                if let Some(km) = keymap.as_mut() {
                    km.insert(
                        path.clone(),
                        Location {
                            line: lines[peek].line_number,
                            column: lines[peek].value_column.unwrap_or(lines[peek].indent),
                            key_line: None,
                            key_column: None,
                            raw_key: None,
                        },
                    );
                }
                items.push(child);
                significant(lines, next)
            } else {
                if let Some(km) = keymap.as_mut() {
                    km.insert(
                        path.clone(),
                        Location {
                            line: line.line_number,
                            column: line.indent + 1,
                            key_line: None,
                            key_column: None,
                            raw_key: None,
                        },
                    );
                }
                items.push(Value::String(String::new()));
                significant(lines, idx + 1)
            }
        };
        path.pop();

        idx = next_idx;
        if idx >= lines.len() {
            break;
        }
        let nxt = &lines[idx];
        if nxt.indent == indent {
            if nxt.kind != LineKind::ListItem {
                return Err(indentation_or_unrecognized(lines, idx, source, last_rest_of_line));
            }
            continue;
        } else if nxt.indent < indent {
            break;
        } else {
            return Err(indentation_or_unrecognized(lines, idx, source, last_rest_of_line));
        }
    }

    Ok((Value::Sequence(items), idx))
}

/// Parse a multiline-string frame. `start` must index a `StringItem` line
/// at `indent`. Blank lines within the run are transparent (skipped by
/// `significant`); a bare `>` is the only way to embed a blank line in the
/// value.
fn parse_multiline_string(
    lines: &[Line],
    start: usize,
    indent: usize,
    _source: &str,
    _opts: &LoadOptions,
    path: &mut KeyPath,
    keymap: &mut Option<Keymap>,
) -> Result<(Value, usize), ParseError> {
    let mut parts: Vec<String> = Vec::new();
    let mut idx = start;

    loop {
        parts.push(lines[idx].value.clone().unwrap_or_default());
        let nxt = significant(lines, idx + 1);
        if nxt >= lines.len() {
            idx = nxt;
            break;
        }
        if lines[nxt].indent == indent && lines[nxt].kind == LineKind::StringItem {
            idx = nxt;
            continue;
        } else if lines[nxt].indent < indent {
            idx = nxt;
            break;
        } else {
            return Err(indentation_or_unrecognized(lines, nxt, _source, None));
        }
    }

    if let Some(km) = keymap.as_mut() {
        km.insert(
            path.clone(),
            Location {
                line: lines[start].line_number,
                column: lines[start].value_column.unwrap_or(indent),
                key_line: None,
                key_column: None,
                raw_key: None,
            },
        );
    }

    Ok((Value::String(parts.join("\n")), idx))
}

/// A `dict-item`/`list-item` rest-of-line value is ordinarily a literal
/// string — the exact rest of that line — but one that begins with `{` or
/// `[` is instead handed to the inline parser. That's how `a: []` yields a
/// `Sequence` rather than the two-character string `"[]"`. A line classified
/// `Inline` covers the case where the bracket opens the line itself (a
/// child frame or the document root); this covers the case where it opens
/// mid-line after a key or dash.
fn rest_of_line_value(
    rest: &str,
    line_number: usize,
    column: usize,
    source: &str,
    path: &mut KeyPath,
    keymap: &mut Option<Keymap>,
) -> Result<Value, ParseError> {
    if rest.starts_with('{') || rest.starts_with('[') {
        inline::parse_inline(rest, line_number, column, source, path, keymap)
    } else {
        Ok(Value::String(rest.to_string()))
    }
}

fn normalize(opts: &LoadOptions, raw_key: &str, path: &KeyPath) -> String {
    match &opts.normalize_key {
        Some(f) => f(raw_key, path),
        None => raw_key.to_string(),
    }
}

/// Insert one resolved `(key, value)` pair into a mapping's `entries`,
/// applying key normalization, the `on_dup` policy, and the keymap entry —
/// in that order: normalization must run before duplicate detection and
/// before keymap insertion, so keymap lookups use the normalized key.
#[allow(clippy::too_many_arguments)]
fn insert_entry(
    entries: &mut Vec<(String, Value)>,
    opts: &LoadOptions,
    source: &str,
    path: &mut KeyPath,
    raw_key: String,
    key_line: usize,
    value: Value,
    value_loc: Location,
    keymap: &mut Option<Keymap>,
) -> Result<(), ParseError> {
    let mut key = normalize(opts, &raw_key, path);

    if let Some(existing) = entries.iter().position(|(k, _)| *k == key) {
        match &opts.on_dup {
            OnDup::Error => {
                return Err(ParseError::new(
                    source,
                    ParseErrorKind::DuplicateKey,
                    format!("duplicate key: {key}"),
                    key_line,
                    value_loc.key_column.unwrap_or(0),
                    String::new(),
                    Vec::new(),
                ));
            }
            OnDup::IgnoreFirst => return Ok(()),
            OnDup::IgnoreLast => {
                entries[existing].1 = value;
                path.push(KeyPathSegment::Key(key));
                if let Some(km) = keymap.as_mut() {
                    km.insert(path.clone(), value_loc);
                }
                path.pop();
                return Ok(());
            }
            OnDup::Callback(cb) => {
                let mut attempt = 0u32;
                loop {
                    key = cb(&raw_key, path, attempt);
                    if !entries.iter().any(|(k, _)| *k == key) {
                        break;
                    }
                    attempt += 1;
                    if attempt > 10_000 {
                        return Err(ParseError::new(
                            source,
                            ParseErrorKind::DuplicateKey,
                            format!("duplicate key: {key} (on_dup callback never produced a unique key)"),
                            key_line,
                            value_loc.key_column.unwrap_or(0),
                            String::new(),
                            Vec::new(),
                        ));
                    }
                }
            }
        }
    }

    entries.push((key.clone(), value));
    path.push(KeyPathSegment::Key(key));
    if let Some(km) = keymap.as_mut() {
        km.insert(path.clone(), value_loc);
    }
    path.pop();
    Ok(())
}

/// Up to two lines of context before and after `idx`, offending line
/// included, in source order.
fn context(lines: &[Line], idx: usize) -> Vec<(usize, String)> {
    let lo = idx.saturating_sub(2);
    let hi = (idx + 2).min(lines.len().saturating_sub(1));
    (lo..=hi).map(|n| (lines[n].line_number, lines[n].raw.clone())).collect()
}

fn structure_error(lines: &[Line], idx: usize, source: &str) -> ParseError {
    let line = &lines[idx];
    ParseError::new(
        source,
        ParseErrorKind::ContentMustStartWithKeyOrBrace,
        "content must start with a key or brace",
        line.line_number,
        line.indent,
        line.raw.clone(),
        context(lines, idx),
    )
}

/// Build an `invalid indentation` error at `idx`. When `prior_value_line` is
/// set, the offending line followed an entry that already carried a
/// rest-of-line value — the message points the reader back at that line.
fn invalid_indentation(lines: &[Line], idx: usize, source: &str, prior_value_line: Option<usize>) -> ParseError {
    let line = &lines[idx];
    let message = match prior_value_line {
        Some(n) => format!("invalid indentation: value already given on line {}", n + 1),
        None => "invalid indentation".to_string(),
    };
    ParseError::new(
        source,
        ParseErrorKind::InvalidIndentation,
        message,
        line.line_number,
        0,
        line.raw.clone(),
        context(lines, idx),
    )
}

/// A line that matched none of the eight recognized shapes at all (the
/// line classifier's own fallback). This is a tokenization-level failure,
/// distinct from a line that classified fine but sits in the wrong place
/// structurally (`invalid_indentation`'s concern).
fn unrecognized_line_error(lines: &[Line], idx: usize, source: &str) -> ParseError {
    let line = &lines[idx];
    ParseError::new(
        source,
        ParseErrorKind::UnrecognizedLine,
        "unrecognized line",
        line.line_number,
        line.indent,
        line.raw.clone(),
        context(lines, idx),
    )
}

/// A mid-frame line that doesn't continue the current frame: if it failed
/// classification outright, that's `UnrecognizedLine`; otherwise it's a
/// recognized line kind sitting at the wrong indentation for this frame,
/// which is `invalid_indentation`'s concern.
fn indentation_or_unrecognized(
    lines: &[Line],
    idx: usize,
    source: &str,
    prior_value_line: Option<usize>,
) -> ParseError {
    if lines[idx].kind == LineKind::Unrecognized {
        unrecognized_line_error(lines, idx, source)
    } else {
        invalid_indentation(lines, idx, source, prior_value_line)
    }
}
