//! The public loader entry points: `load`/`load_str` and their
//! keymap-returning counterparts.
//!
//! This module owns the option types (`LoadOptions`, `Top`, `OnDup`) and the
//! thin wiring from bytes/string to [`crate::line::classify`] to
//! [`crate::block::parse_document`]; the actual indentation/nesting logic
//! lives in `block`, and single-line `{...}`/`[...]` parsing lives in
//! `inline`. This file stays to "decode, classify, hand off, unwrap the
//! empty-document case" — assembling components, not reimplementing them.

use std::rc::Rc;

use crate::block;
use crate::error::{ParseError, ParseErrorKind};
use crate::keymap::Keymap;
use crate::line;
use crate::value::{KeyPath, Value};

/// The `top` constraint a caller may place on the root value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Top {
    #[default]
    Any,
    Dict,
    List,
    Str,
}

/// Policy applied when a mapping would otherwise receive two entries with
/// the same (possibly normalized) key.
#[derive(Clone)]
pub enum OnDup {
    /// Raise `ParseErrorKind::DuplicateKey` (the default).
    Error,
    /// Keep the first occurrence; later duplicates are silently dropped.
    IgnoreFirst,
    /// Keep the last occurrence; earlier ones are silently overwritten.
    IgnoreLast,
    /// Ask the callback for a replacement key, `(raw_key, key_path,
    /// attempt)`. Called repeatedly with an incrementing `attempt` counter
    /// until it returns a key not already present in the mapping.
    Callback(Rc<dyn Fn(&str, &KeyPath, u32) -> String>),
}

impl std::fmt::Debug for OnDup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnDup::Error => f.write_str("OnDup::Error"),
            OnDup::IgnoreFirst => f.write_str("OnDup::IgnoreFirst"),
            OnDup::IgnoreLast => f.write_str("OnDup::IgnoreLast"),
            OnDup::Callback(_) => f.write_str("OnDup::Callback(..)"),
        }
    }
}

impl Default for OnDup {
    fn default() -> Self {
        OnDup::Error
    }
}

/// Options controlling one `load`/`load_str` call.
#[derive(Clone, Default)]
pub struct LoadOptions {
    pub top: Top,
    pub on_dup: OnDup,
    /// Receives `(raw_key, parent_key_path)` and returns the key to store
    /// in the mapping. Runs before duplicate detection and keymap
    /// insertion, so keymap lookups use the normalized key while
    /// `Location::raw_key` still holds the original source text.
    pub normalize_key: Option<Rc<dyn Fn(&str, &KeyPath) -> String>>,
    /// Label attached to any `ParseError` raised while loading, typically
    /// a filename. Defaults to `<string>`.
    pub source: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(mut self, top: Top) -> Self {
        self.top = top;
        self
    }

    pub fn on_dup(mut self, on_dup: OnDup) -> Self {
        self.on_dup = on_dup;
        self
    }

    pub fn normalize_key(mut self, f: impl Fn(&str, &KeyPath) -> String + 'static) -> Self {
        self.normalize_key = Some(Rc::new(f));
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn source_label(&self) -> String {
        self.source.clone().unwrap_or_else(|| "<string>".to_string())
    }
}

/// Load an already-decoded document. Returns `None` only when the document
/// is empty (or blanks/comments only) and `opts.top` is `Top::Any`; every
/// other combination of empty input and `top` yields the constrained
/// empty value (`{}`, `[]`, or `""`).
pub fn load_str(text: &str, opts: &LoadOptions) -> Result<Option<Value>, ParseError> {
    let source = opts.source_label();
    let lines = line::classify(text, &source)?;
    let mut keymap = None;
    block::parse_document(&lines, &source, opts, &mut keymap)
}

/// Like [`load_str`], but also returns the populated [`Keymap`].
pub fn load_str_with_keymap(text: &str, opts: &LoadOptions) -> Result<(Option<Value>, Keymap), ParseError> {
    let source = opts.source_label();
    let lines = line::classify(text, &source)?;
    let mut keymap = Some(Keymap::new());
    let value = block::parse_document(&lines, &source, opts, &mut keymap)?;
    Ok((value, keymap.unwrap()))
}

/// Decode `bytes` as UTF-8 and load it. A non-UTF-8 document is reported as
/// a `ParseError` at line 0, column 0, rather than a separate error type —
/// from the caller's point of view it's just another way this document
/// failed to parse.
pub fn load(bytes: &[u8], opts: &LoadOptions) -> Result<Option<Value>, ParseError> {
    let text = decode_utf8(bytes, opts)?;
    load_str(&text, opts)
}

/// Like [`load`], but also returns the populated [`Keymap`].
pub fn load_with_keymap(bytes: &[u8], opts: &LoadOptions) -> Result<(Option<Value>, Keymap), ParseError> {
    let text = decode_utf8(bytes, opts)?;
    load_str_with_keymap(&text, opts)
}

fn decode_utf8(bytes: &[u8], opts: &LoadOptions) -> Result<String, ParseError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        ParseError::new(
            opts.source_label(),
            ParseErrorKind::InvalidEncoding,
            format!("document is not valid UTF-8: {e}"),
            0,
            0,
            String::new(),
            Vec::new(),
        )
    })
}
