//! Error types for loading and dumping NestedText documents.
//!
//! Both error types carry enough structure to satisfy the external error
//! object shape (`source`, `line`, `line-number`, `column`, `message`,
//! `template`): `message` is the fully-interpolated text, `template` is the
//! un-interpolated pattern a localizer could substitute strings into. The
//! "extended codicil" (the offending line plus surrounding context with a
//! caret) is rendered on demand via [`ParseError::codicil`] rather than
//! stored as a formatted field, since it's a display-time convenience.

use thiserror::Error;

/// Taxonomy of load-time failures. Names classify the failure, not its
/// exact wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A tab character appeared among a line's leading whitespace.
    TabInIndentation,
    /// A line matched none of the recognized line kinds.
    UnrecognizedLine,
    /// The inline `{...}`/`[...]` grammar rejected the line.
    InlineSyntax,
    /// The document (or a sub-block) didn't open with a key or a brace.
    ContentMustStartWithKeyOrBrace,
    /// A line's indent doesn't match any open frame, or a value already
    /// given on the prior line was followed by further indentation.
    InvalidIndentation,
    /// The root value's kind didn't match the caller's `top` constraint.
    TopLevelTypeMismatch,
    /// A mapping key repeated and `on_dup` did not absorb the conflict.
    DuplicateKey,
    /// A multiline key had no indented value and no default was permitted.
    MultilineKeyWithoutValue,
    /// The document bytes could not be decoded as UTF-8.
    InvalidEncoding,
}

impl ParseErrorKind {
    /// The un-interpolated message pattern for this kind, suitable for
    /// localization.
    pub fn template(&self) -> &'static str {
        match self {
            ParseErrorKind::TabInIndentation => "tab in indentation",
            ParseErrorKind::UnrecognizedLine => "unrecognized line",
            ParseErrorKind::InlineSyntax => "invalid inline syntax: {detail}",
            ParseErrorKind::ContentMustStartWithKeyOrBrace => {
                "content must start with a key or brace"
            }
            ParseErrorKind::InvalidIndentation => "invalid indentation",
            ParseErrorKind::TopLevelTypeMismatch => "wrong top-level type, expected {expected}",
            ParseErrorKind::DuplicateKey => "duplicate key: {key}",
            ParseErrorKind::MultilineKeyWithoutValue => "multiline key without indented value",
            ParseErrorKind::InvalidEncoding => "document could not be decoded: {detail}",
        }
    }
}

/// A load-time failure, located at a specific line and column of the
/// source document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source}: line {line_number}, column {column}: {message}")]
pub struct ParseError {
    /// The caller-supplied source label (defaults to `<string>`).
    pub source: String,
    /// The text of the offending line, without its terminator.
    pub line: String,
    /// 0-based line number.
    pub line_number: usize,
    /// 0-based column.
    pub column: usize,
    pub kind: ParseErrorKind,
    pub message: String,
    pub template: &'static str,
    /// `(line_number, text)` pairs for up to two lines of context before
    /// and after the offending line, in source order, offending line
    /// included.
    pub(crate) context: Vec<(usize, String)>,
}

impl ParseError {
    pub(crate) fn new(
        source: impl Into<String>,
        kind: ParseErrorKind,
        message: impl Into<String>,
        line_number: usize,
        column: usize,
        line: impl Into<String>,
        context: Vec<(usize, String)>,
    ) -> Self {
        ParseError {
            source: source.into(),
            line: line.into(),
            line_number,
            column,
            kind,
            message: message.into(),
            template: kind.template(),
            context,
        }
    }

    /// Render the offending line plus up to two lines of surrounding
    /// context with a caret marking the error column, for rich display.
    pub fn codicil(&self) -> String {
        let mut out = String::new();
        for (n, text) in &self.context {
            out.push_str(&format!("{:>5} │{}\n", n + 1, text));
            if *n == self.line_number {
                out.push_str(&format!("      │{}^\n", " ".repeat(self.column)));
            }
        }
        out
    }
}

/// Taxonomy of dump-time failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpErrorKind {
    /// A leaf couldn't be converted to a `Value` and `default` was `strict`.
    UnsupportedType,
    /// A value forced inline (via `inline_level`) violates inline-string
    /// character constraints.
    UnrepresentableInline,
    /// `map_keys` collapsed two distinct sibling keys into one.
    DuplicateKeyAfterNormalization,
    /// An option value was out of its documented range (e.g. `indent < 2`).
    InvalidOption,
}

impl DumpErrorKind {
    pub fn template(&self) -> &'static str {
        match self {
            DumpErrorKind::UnsupportedType => "unsupported type at {path}",
            DumpErrorKind::UnrepresentableInline => "unrepresentable inline value at {path}",
            DumpErrorKind::DuplicateKeyAfterNormalization => {
                "duplicate key after normalization: {key}"
            }
            DumpErrorKind::InvalidOption => "invalid option: {detail}",
        }
    }
}

/// A dump-time failure, located by the key-path of the offending node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DumpError {
    pub key_path: crate::value::KeyPath,
    pub kind: DumpErrorKind,
    pub message: String,
    pub template: &'static str,
}

impl DumpError {
    pub(crate) fn new(
        kind: DumpErrorKind,
        message: impl Into<String>,
        key_path: crate::value::KeyPath,
    ) -> Self {
        DumpError {
            key_path,
            kind,
            message: message.into(),
            template: kind.template(),
        }
    }
}
